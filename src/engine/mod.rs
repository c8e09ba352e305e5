pub mod domain;
pub mod enforcer;
pub mod learner;
pub mod loader;
pub mod rules;
pub mod state;
pub mod tracker;
pub mod traits;

pub use self::domain::{normalize, Domain, InvalidDomain};
pub use self::enforcer::MemoryRuleEnforcer;
pub use self::learner::{ObservationLog, Promotion, PROMOTION_THRESHOLD};
pub use self::loader::StaticListLoader;
pub use self::rules::{build_rules, BlockRule, ResourceType, RuleId, RuleSynchronizer};
pub use self::state::{ClassificationState, ListOp, StateSnapshot, TabId, UserList};
pub use self::tracker::{RequestEvent, RequestOutcome, TrackerEngine};
pub use self::traits::{BadgeSink, RuleEnforcer};
