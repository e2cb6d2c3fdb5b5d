// Adapters behind the application ports

pub mod csv_output_adapter;
pub mod http_client;

pub use csv_output_adapter::CsvOutputAdapter;
pub use http_client::ReqwestFetcher;
