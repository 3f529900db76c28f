use crate::model;

pub mod http;
pub mod mock;

pub trait Transport {
    fn send(
        &self,
        req: &model::http::TransportRequest,
    ) -> Result<model::http::TransportResponse, model::error::StorageError>;
}
