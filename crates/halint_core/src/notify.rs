//! Notification stream.
//!
//! The analysis emits one [`Notification`] per detected event. Which ones
//! reach the [`NotificationSink`] is decided by [`LintOptions`]: an
//! owner-name allow-list plus switches for the noisier kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// What a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Merge overflow above the cap.
    CapLoss,
    /// Production overflow with merging strength.
    CapLossExProduction,
    /// Production overflow on a stationary square.
    StillBigCapLoss,
    /// A zero-strength unit moved.
    ZeroStrengthMove,
    /// Insufficient force against a neutral square.
    FailedMining,
    /// Two units of one owner swapped back and forth.
    FlipFlop,
    /// Redundant attacking strength; named after the defender.
    Overkill,
}

impl NotificationKind {
    /// Message text.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            NotificationKind::CapLoss => "Cap loss at",
            NotificationKind::CapLossExProduction => "Cap loss ex production at",
            NotificationKind::StillBigCapLoss => "StillBig cap loss at",
            NotificationKind::ZeroStrengthMove => "Zero strength move at",
            NotificationKind::FailedMining => "Failed mining attempt at",
            NotificationKind::FlipFlop => "Flip-flop move at",
            NotificationKind::Overkill => "Overkill received from",
        }
    }
}

/// A single reported event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notification {
    /// Event kind.
    pub kind: NotificationKind,
    /// Frame index.
    pub frame: usize,
    /// Owner the event is reported against.
    pub owner: PlayerId,
    /// Display name of `owner`.
    pub owner_name: String,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Amount, where the kind has one.
    pub value: Option<u32>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame {:>3}: {:>16}: {:>25} ({:>2},{:>2})",
            self.frame,
            self.owner_name,
            self.kind.message(),
            self.x,
            self.y
        )?;
        if let Some(value) = self.value {
            write!(f, ": {value:>3}")?;
        }
        Ok(())
    }
}

/// Receiver of notifications.
pub trait NotificationSink {
    /// Handle one notification.
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl NotificationSink for DiscardSink {
    fn notify(&mut self, _notification: Notification) {}
}

/// Owner-name allow-list.
///
/// A name passes if any listed fragment is a substring of it. An empty list
/// lets every name through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFilter {
    fragments: Vec<String>,
}

impl NameFilter {
    /// Filter that accepts every name.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Filter from explicit fragments.
    #[must_use]
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter from a whitespace-separated list, as given on the command line.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self::new(list.split_whitespace())
    }

    /// Whether notifications for `name` should be emitted.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.fragments.is_empty() || self.fragments.iter().any(|f| name.contains(f.as_str()))
    }

    /// Listed fragments.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Activation switches for the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintOptions {
    /// Which owners to report on.
    pub names: NameFilter,
    /// Report production-caused cap loss per event.
    pub show_caploss_from_production: bool,
    /// Report overkill per event.
    pub show_overkill: bool,
    /// Report flip-flops per event.
    pub show_flip_flops: bool,
}

impl LintOptions {
    /// Whether `kind` is switched on.
    #[must_use]
    pub const fn is_enabled(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::CapLossExProduction | NotificationKind::StillBigCapLoss => {
                self.show_caploss_from_production
            }
            NotificationKind::Overkill => self.show_overkill,
            NotificationKind::FlipFlop => self.show_flip_flops,
            NotificationKind::CapLoss
            | NotificationKind::ZeroStrengthMove
            | NotificationKind::FailedMining => true,
        }
    }
}

/// Applies [`LintOptions`] in front of a sink.
pub struct Notifier<'a> {
    options: &'a LintOptions,
    names: &'a [String],
    sink: &'a mut dyn NotificationSink,
    emitted: usize,
}

impl<'a> Notifier<'a> {
    /// Wrap `sink`. `names` is the 1-indexed player name list.
    pub fn new(options: &'a LintOptions, names: &'a [String], sink: &'a mut dyn NotificationSink) -> Self {
        Self {
            options,
            names,
            sink,
            emitted: 0,
        }
    }

    /// Emit an event if its kind is enabled and its owner passes the filter.
    pub fn emit(
        &mut self,
        kind: NotificationKind,
        frame: usize,
        owner: PlayerId,
        x: usize,
        y: usize,
        value: Option<u32>,
    ) {
        if !self.options.is_enabled(kind) {
            return;
        }
        let owner_name = self
            .names
            .get(usize::from(owner))
            .map_or("", String::as_str);
        if !self.options.names.allows(owner_name) {
            return;
        }
        self.emitted += 1;
        self.sink.notify(Notification {
            kind,
            frame,
            owner,
            owner_name: owner_name.to_string(),
            x,
            y,
            value,
        });
    }

    /// Notifications passed to the sink so far.
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }
}

impl fmt::Debug for Notifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("options", &self.options)
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}
