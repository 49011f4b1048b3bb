pub mod exchange;
pub mod factory;
pub mod file_exchange;
pub mod interactive;
pub mod remote;
pub mod request;
pub mod stub;
pub mod traits;

pub use exchange::{RequestQueue, ResponseQueue};
pub use factory::create_backend;
pub use request::{
    FinishReason, GenerationKind, GenerationRequest, GenerationResponse, RequestId,
    RequestSequence,
};
pub use traits::Backend;
