use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("mysql container failed: {0}")]
    Container(#[from] testcontainers::TestcontainersError),
    #[error("mysql did not accept connections after {attempts} attempts: {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
