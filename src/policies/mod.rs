mod fixed_interval;

pub use fixed_interval::{
    FixedInterval, FixedIntervalBuilder, FixedIntervalTimed, FixedIntervalWithDeadline,
};
