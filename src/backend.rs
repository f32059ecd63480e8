use std::time::Duration;

use log::{debug, error, info};
use tonic::async_trait;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::proto::hbase_service_client::HbaseServiceClient;
use crate::proto::{
    CreateNamespaceRequest, CreateTableRequest, GetMultipleRequest, GetRequest,
    PutMultipleRequest, PutRequest, ScannerResultsRequest, TGet, TNamespaceDescriptor, TPut,
    TResult, TScan, TTableDescriptor,
};

pub const ACCESS_KEY_ID_HEADER: &str = "accesskeyid";
pub const ACCESS_SIGNATURE_HEADER: &str = "accesssignature";

/// The RPC surface of a wide-column store.
///
/// Every method is a single request/response exchange. The session layer
/// builds on top of this, so tests can swap in an in-process implementation.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, table: &[u8], get: TGet) -> std::result::Result<TResult, Status>;

    async fn get_multiple(
        &self,
        table: &[u8],
        gets: Vec<TGet>,
    ) -> std::result::Result<Vec<TResult>, Status>;

    async fn put(&self, table: &[u8], put: TPut) -> std::result::Result<(), Status>;

    async fn put_multiple(&self, table: &[u8], puts: Vec<TPut>) -> std::result::Result<(), Status>;

    /// Returns up to `page_size` rows of `scan`. The server opens and closes
    /// its own scanner for every call.
    async fn scan_page(
        &self,
        table: &[u8],
        scan: TScan,
        page_size: i32,
    ) -> std::result::Result<Vec<TResult>, Status>;

    async fn create_namespace(
        &self,
        descriptor: TNamespaceDescriptor,
    ) -> std::result::Result<(), Status>;

    async fn create_table(
        &self,
        descriptor: TTableDescriptor,
        split_keys: Vec<Vec<u8>>,
    ) -> std::result::Result<(), Status>;
}

/// Static credentials attached to every request.
#[derive(Clone, Debug)]
pub struct Credentials {
    access_key_id: MetadataValue<Ascii>,
    signature: MetadataValue<Ascii>,
}

impl Credentials {
    pub fn new(access_key_id: &str, signature: &str) -> Result<Self> {
        let access_key_id = MetadataValue::try_from(access_key_id)
            .map_err(|_| Error::InvalidConfig("access_key_id is not a valid header value".into()))?;
        let signature = MetadataValue::try_from(signature)
            .map_err(|_| Error::InvalidConfig("access_signature is not a valid header value".into()))?;
        Ok(Credentials {
            access_key_id,
            signature,
        })
    }

    /// Wraps `message` in a request carrying both credential headers.
    pub fn authorize<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        let metadata = request.metadata_mut();
        metadata.insert(ACCESS_KEY_ID_HEADER, self.access_key_id.clone());
        metadata.insert(ACCESS_SIGNATURE_HEADER, self.signature.clone());
        request
    }
}

/// `Backend` over a tonic channel.
#[derive(Clone, Debug)]
pub struct RpcBackend {
    client: HbaseServiceClient<Channel>,
    credentials: Credentials,
}

impl RpcBackend {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let credentials = Credentials::new(&settings.access_key_id, &settings.access_signature)?;
        let endpoint = settings.endpoint.clone();
        let connect_error = |message: String| Error::Connect {
            endpoint: endpoint.clone(),
            message,
        };

        info!("Opening connection to {}", endpoint);
        let channel = Endpoint::from_shared(endpoint.clone())
            .map_err(|e| connect_error(e.to_string()))?
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .connect()
            .await
            .map_err(|e| {
                error!("Error opening {}: {}", endpoint, e);
                connect_error(e.to_string())
            })?;
        debug!("Connection to {} established", endpoint);

        Ok(Self::new(channel, credentials))
    }

    pub fn new(channel: Channel, credentials: Credentials) -> Self {
        RpcBackend {
            client: HbaseServiceClient::new(channel),
            credentials,
        }
    }
}

#[async_trait]
impl Backend for RpcBackend {
    async fn get(&self, table: &[u8], get: TGet) -> std::result::Result<TResult, Status> {
        let request = self.credentials.authorize(GetRequest {
            table: table.to_vec(),
            get: Some(get),
        });
        let response = self.client.clone().get(request).await?;
        Ok(response.into_inner())
    }

    async fn get_multiple(
        &self,
        table: &[u8],
        gets: Vec<TGet>,
    ) -> std::result::Result<Vec<TResult>, Status> {
        let request = self.credentials.authorize(GetMultipleRequest {
            table: table.to_vec(),
            gets,
        });
        let response = self.client.clone().get_multiple(request).await?;
        Ok(response.into_inner().results)
    }

    async fn put(&self, table: &[u8], put: TPut) -> std::result::Result<(), Status> {
        let request = self.credentials.authorize(PutRequest {
            table: table.to_vec(),
            put: Some(put),
        });
        self.client.clone().put(request).await?;
        Ok(())
    }

    async fn put_multiple(&self, table: &[u8], puts: Vec<TPut>) -> std::result::Result<(), Status> {
        let request = self.credentials.authorize(PutMultipleRequest {
            table: table.to_vec(),
            puts,
        });
        self.client.clone().put_multiple(request).await?;
        Ok(())
    }

    async fn scan_page(
        &self,
        table: &[u8],
        scan: TScan,
        page_size: i32,
    ) -> std::result::Result<Vec<TResult>, Status> {
        let request = self.credentials.authorize(ScannerResultsRequest {
            table: table.to_vec(),
            scan: Some(scan),
            number_of_rows: page_size,
        });
        let response = self.client.clone().get_scanner_results(request).await?;
        Ok(response.into_inner().results)
    }

    async fn create_namespace(
        &self,
        descriptor: TNamespaceDescriptor,
    ) -> std::result::Result<(), Status> {
        let request = self.credentials.authorize(CreateNamespaceRequest {
            descriptor: Some(descriptor),
        });
        self.client.clone().create_namespace(request).await?;
        Ok(())
    }

    async fn create_table(
        &self,
        descriptor: TTableDescriptor,
        split_keys: Vec<Vec<u8>>,
    ) -> std::result::Result<(), Status> {
        let request = self.credentials.authorize(CreateTableRequest {
            descriptor: Some(descriptor),
            split_keys,
        });
        self.client.clone().create_table(request).await?;
        Ok(())
    }
}
