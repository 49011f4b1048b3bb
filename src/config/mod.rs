pub mod schema;

pub use schema::{
    BackendConfig, BackendKind, Config, CorpusConfig, ExchangeConfig, GateConfig,
    GenerationConfig, HistoryConfig,
};
