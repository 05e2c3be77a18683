use crate::core::dispatcher::DEFAULT_MAX_WORKERS;
use crate::core::extraction::ExtractionSchema;
use crate::domain::model::Endpoint;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub job: JobConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub transport: TransportSection,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub schema: ExtractionSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_job_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn default_job_name() -> String {
    "url-enrichment".to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: default_job_name(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    #[serde(default = "default_url_column")]
    pub url_column: String,
}

fn default_url_column() -> String {
    "API_URL".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Required; there is no implicit infinite wait.
    pub timeout_seconds: Option<u64>,
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportSection {
    #[serde(default)]
    pub insecure_skip_hostname_verification: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_HOST})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn timeout_seconds(&self) -> Result<u64> {
        validation::validate_required_field(
            "dispatch.timeout_seconds",
            &self.dispatch.timeout_seconds,
        )
        .copied()
    }

    /// Every column the run writes, after endpoint suffixes are applied.
    pub fn output_columns(&self) -> Vec<String> {
        self.endpoints
            .iter()
            .flat_map(|endpoint| self.schema.output_columns(endpoint))
            .collect()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, &["csv"])?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_file_extension("output.path", &self.output.path, &["csv"])?;
        validation::validate_non_empty_string("input.url_column", &self.input.url_column)?;

        validation::validate_positive_number("dispatch.max_workers", self.dispatch.max_workers, 1)?;
        let timeout = self.timeout_seconds()?;
        validation::validate_range("dispatch.timeout_seconds", timeout, 1, MAX_TIMEOUT_SECONDS)?;

        for endpoint in &self.endpoints {
            validation::validate_non_empty_string("endpoints.name", &endpoint.name)?;
            validation::validate_url("endpoints.url", &endpoint.url)?;
        }
        validation::validate_unique(
            "endpoints.name",
            self.endpoints.iter().map(|e| e.name.as_str()),
        )?;

        validation::validate_non_empty_string("schema.error_column", &self.schema.error_column)?;
        for field in &self.schema.fields {
            validation::validate_non_empty_string("schema.fields.column", &field.column)?;
            validation::validate_non_empty_string("schema.fields.path", &field.path)?;
        }

        let columns = self.output_columns();
        validation::validate_unique("schema", columns.iter().map(String::as_str))?;
        if columns.contains(&self.input.url_column) {
            return Err(EtlError::ConfigValidationError {
                field: "schema".to_string(),
                message: format!(
                    "output columns would overwrite the input column '{}'",
                    self.input.url_column
                ),
            });
        }

        if self.endpoints.is_empty() {
            tracing::warn!("⚠️ No endpoints configured; the output will only gain empty columns");
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn url_column(&self) -> &str {
        &self.input.url_column
    }

    fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    fn max_workers(&self) -> usize {
        self.dispatch.max_workers
    }

    fn request_timeout(&self) -> Duration {
        // validate() rejects a missing timeout before a pipeline is built
        Duration::from_secs(self.dispatch.timeout_seconds.unwrap_or(MAX_TIMEOUT_SECONDS))
    }

    fn insecure_skip_hostname_verification(&self) -> bool {
        self.transport.insecure_skip_hostname_verification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extraction::FieldFormat;

    const TWO_ENDPOINTS: &str = r#"
[job]
name = "products"

[input]
path = "api_test.csv"

[output]
path = "results_both_apis.csv"

[dispatch]
max_workers = 8
timeout_seconds = 30

[[endpoints]]
name = "ParseUrl"
url = "https://content.example.com/api/Products/ParseUrl"
column_suffix = "_api1"

[[endpoints]]
name = "ParseUrlv2"
url = "https://content.example.com/api/Products/ParseUrlv2"
column_suffix = "_api2"
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = TomlConfig::from_toml_str(TWO_ENDPOINTS).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.job.name, "products");
        assert_eq!(config.url_column(), "API_URL");
        assert_eq!(config.max_workers(), 8);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(!config.insecure_skip_hostname_verification());
        assert_eq!(config.endpoints().len(), 2);
        assert_eq!(config.schema(), &ExtractionSchema::product());

        let columns = config.output_columns();
        assert!(columns.contains(&"name_api1".to_string()));
        assert!(columns.contains(&"error_api2".to_string()));
        assert_eq!(columns.len(), 16);
    }

    #[test]
    fn test_missing_timeout_rejected() {
        let content = TWO_ENDPOINTS.replace("timeout_seconds = 30", "");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(EtlError::MissingConfigError { field }) if field == "dispatch.timeout_seconds"
        ));
    }

    #[test]
    fn test_colliding_columns_rejected() {
        let content =
            TWO_ENDPOINTS.replace("column_suffix = \"_api2\"", "column_suffix = \"_api1\"");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_url = TWO_ENDPOINTS.replace(
            "https://content.example.com/api/Products/ParseUrlv2",
            "not a url",
        );
        assert!(TomlConfig::from_toml_str(&bad_url).unwrap().validate().is_err());

        let zero_workers = TWO_ENDPOINTS.replace("max_workers = 8", "max_workers = 0");
        assert!(TomlConfig::from_toml_str(&zero_workers).unwrap().validate().is_err());

        let xlsx = TWO_ENDPOINTS.replace("api_test.csv", "api_test.xlsx");
        assert!(TomlConfig::from_toml_str(&xlsx).unwrap().validate().is_err());

        let long_timeout = TWO_ENDPOINTS.replace("timeout_seconds = 30", "timeout_seconds = 7200");
        assert!(TomlConfig::from_toml_str(&long_timeout).unwrap().validate().is_err());
    }

    #[test]
    fn test_custom_schema_and_insecure_profile() {
        let content = r#"
[input]
path = "in.csv"
url_column = "link"

[output]
path = "out.csv"

[dispatch]
timeout_seconds = 5

[transport]
insecure_skip_hostname_verification = true

[[endpoints]]
name = "ParseUrl"
url = "https://content.example.com/api/Products/ParseUrl"

[schema]
error_column = "Response"

[[schema.fields]]
column = "image"
path = "images"
format = "brace_list"
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_workers(), DEFAULT_MAX_WORKERS);
        assert!(config.insecure_skip_hostname_verification());
        assert_eq!(config.schema().fields[0].format, FieldFormat::BraceList);
        assert_eq!(config.output_columns(), vec!["image", "Response"]);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[input\npath = ").unwrap_err();
        assert!(matches!(
            &err,
            EtlError::ConfigError { message } if message.starts_with("TOML parsing error")
        ));
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Configuration);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("URL_ENRICHER_TEST_HOST", "content.example.org");
        let content = TWO_ENDPOINTS.replace("content.example.com", "${URL_ENRICHER_TEST_HOST}");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(
            config.endpoints()[0].url,
            "https://content.example.org/api/Products/ParseUrl"
        );

        let untouched = TomlConfig::substitute_env_vars("url = \"${URL_ENRICHER_UNSET_VAR}\"");
        assert_eq!(untouched, "url = \"${URL_ENRICHER_UNSET_VAR}\"");
    }
}
