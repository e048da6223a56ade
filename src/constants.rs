/// Destination table and column layout. Records are mapped onto these columns by position.
pub const DESTINATION_TABLE: &str = "training_employee_records";

pub const DESTINATION_COLUMNS: [&str; 10] = [
    "employee_id",
    "employee_name",
    "department",
    "gender",
    "training_date",
    "training_category",
    "course",
    "training_mode",
    "no_of_training_session",
    "training_hours",
];

pub const TRAINING_DATE_COLUMN: &str = "training_date";

// Pipeline defaults (overridable from etl.toml)
pub const DEFAULT_CONFIG_FILE: &str = "etl.toml";
pub const DEFAULT_INPUT_DIR: &str = "training_files";
pub const DEFAULT_INPUT_EXTENSION: &str = ".csv";
pub const RAW_ARTIFACT_FILE: &str = "extracted_training.json";
pub const CLEAN_ARTIFACT_FILE: &str = "transformed_training.json";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_DIR: &str = "logs";

// Destination credentials
pub const ENV_MYSQL_HOST: &str = "MYSQL_HOST";
pub const ENV_MYSQL_PORT: &str = "MYSQL_PORT";
pub const ENV_MYSQL_USER: &str = "MYSQL_USER";
pub const ENV_MYSQL_PASSWORD: &str = "MYSQL_PASSWORD";
pub const ENV_MYSQL_DATABASE: &str = "MYSQL_DATABASE";

/// Cell contents treated as missing values when reading the input file.
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_marker(value: &str) -> bool {
    NA_MARKERS.contains(&value)
}
