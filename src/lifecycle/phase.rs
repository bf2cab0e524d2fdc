use strum_macros::{Display, EnumIter, EnumString};

/// Startup milestones in their fixed order, plus the terminal failure phase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecyclePhase {
    Starting,
    EnvironmentPrepared,
    ContextInitialized,
    ContextLoaded,
    Started,
    Ready,
    Failed,
}

impl LifecyclePhase {
    /// The phase that follows this one in a successful startup.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Starting => Some(Self::EnvironmentPrepared),
            Self::EnvironmentPrepared => Some(Self::ContextInitialized),
            Self::ContextInitialized => Some(Self::ContextLoaded),
            Self::ContextLoaded => Some(Self::Started),
            Self::Started => Some(Self::Ready),
            Self::Ready | Self::Failed => None,
        }
    }

    /// Whether a startup currently at `current` may move to `self`.
    ///
    /// `None` means no phase has been announced yet.
    pub fn can_follow(self, current: Option<Self>) -> bool {
        match (current, self) {
            (Some(Self::Failed), _) => false,
            (_, Self::Failed) => true,
            (None, next) => next == Self::Starting,
            (Some(current), next) => current.next() == Some(next),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn phases_are_totally_ordered() {
        let phases: Vec<_> = LifecyclePhase::iter().collect();
        let mut sorted = phases.clone();
        sorted.sort();
        assert_eq!(phases, sorted);
        assert_eq!(LifecyclePhase::Starting.next(), Some(LifecyclePhase::EnvironmentPrepared));
        assert_eq!(LifecyclePhase::Ready.next(), None);
    }

    #[test]
    fn transitions() {
        assert!(LifecyclePhase::Starting.can_follow(None));
        assert!(!LifecyclePhase::Started.can_follow(None));
        assert!(LifecyclePhase::Failed.can_follow(None));
        assert!(LifecyclePhase::Failed.can_follow(Some(LifecyclePhase::Ready)));
        assert!(!LifecyclePhase::Ready.can_follow(Some(LifecyclePhase::ContextLoaded)));
        assert!(!LifecyclePhase::Failed.can_follow(Some(LifecyclePhase::Failed)));
    }

    #[test]
    fn display_names() {
        assert_eq!(LifecyclePhase::EnvironmentPrepared.to_string(), "ENVIRONMENT_PREPARED");
        assert_eq!(
            "CONTEXT_LOADED".parse::<LifecyclePhase>().unwrap(),
            LifecyclePhase::ContextLoaded
        );
    }
}
