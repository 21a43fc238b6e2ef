use thiserror::Error;

use crate::catalog::CatalogError;
use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum DepgraphError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DepgraphError>;
