pub mod answer;
pub mod builder;
pub mod clock;
pub mod core;
pub mod nameservers;
pub mod reverse;
pub mod transaction;

pub use answer::{Answer, AnswerError};
pub use builder::StubResolverBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use self::core::{StubResolver, IDLE_TICK, MAX_LIVE_TRANSACTIONS};
pub use nameservers::{retry_frequency, NameServerSet, NameServerStats};
pub use reverse::reverse_name;
pub use transaction::{QueryCallback, QueryKind, INITIAL_RETRIES, INITIAL_TIMEOUT};
