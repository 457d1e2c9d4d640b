use crate::error::{BadEnvVarSnafu, ParsePortSnafu, SsisResult};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    image_host_config: Arc<ImageHostConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> SsisResult<Self> {
        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            image_host_config: Arc::new(ImageHostConfig::new()?),
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn image_host_config(&self) -> Arc<ImageHostConfig> {
        self.image_host_config.clone()
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> SsisResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}

#[derive(Debug)]
pub struct ImageHostConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: SecretString,
    pub folder: String,
    pub public_base: String,
}

impl ImageHostConfig {
    pub fn new() -> SsisResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        let endpoint = get_env_var("IMAGE_ENDPOINT")?;
        let bucket = get_env_var("IMAGE_BUCKET")?;
        //path-style URL unless the deployment fronts the bucket itself
        let public_base = var("IMAGE_PUBLIC_BASE")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));

        Ok(Self {
            endpoint,
            region: get_env_var("IMAGE_REGION")?,
            bucket,
            access_key: get_env_var("IMAGE_ACCESS_KEY")?,
            secret_key: SecretString::from(get_env_var("IMAGE_SECRET_KEY")?),
            folder: get_env_var("IMAGE_FOLDER")?,
            public_base,
        })
    }
}
