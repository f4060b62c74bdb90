pub mod copula;
pub mod marginal;
