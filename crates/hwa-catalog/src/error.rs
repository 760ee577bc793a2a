use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Unknown variable: {key}")]
    UnknownVariable { key: String },

    #[error("Unknown engine symbol: {symbol}")]
    UnknownSymbol { symbol: String },
}
