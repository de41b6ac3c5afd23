pub mod grade_exchange;
