pub mod ports;
pub mod clean_use_case;
pub mod assess_use_case;
pub mod analyze_use_case;
