mod pattern_formatter;

pub use pattern_formatter::{
    validate_time_format, PatternFormatter, PatternFormatterConfig, LINE_ENDING, UNKNOWN,
};
