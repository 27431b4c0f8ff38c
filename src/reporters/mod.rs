mod csv_report;

pub use csv_report::{HEADER, TOTAL_LABEL, format_ratio, render_csv, report_csv};
