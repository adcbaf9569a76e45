// src/services/aws.rs
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sesv2::Client as SesClient;
use bytes::Bytes;
use std::env;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("AWS credentials not configured")]
    NotConfigured,

    #[error("S3 operation failed: {0}")]
    S3Error(String),

    #[error("SES operation failed: {0}")]
    SesError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub s3_bucket_name: String,
    pub ses_from_email: String,
    pub ses_region: String,
}

impl AwsConfig {
    /// Read AWS configuration from environment variables.
    /// Returns None when the key pair is absent, which switches media
    /// storage to the local fallback and disables outbound email.
    pub fn from_env() -> Option<Self> {
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok()?;

        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return None;
        }

        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_bucket_name = env::var("AWS_S3_BUCKET_NAME").unwrap_or_default();
        let ses_from_email = env::var("AWS_SES_FROM_EMAIL").unwrap_or_default();
        let ses_region = env::var("AWS_SES_REGION").unwrap_or_else(|_| region.clone());

        Some(Self {
            access_key_id,
            secret_access_key,
            region,
            s3_bucket_name,
            ses_from_email,
            ses_region,
        })
    }
}

#[derive(Debug)]
pub struct AwsService {
    config: Option<AwsConfig>,
}

impl AwsService {
    pub fn new(config: Option<AwsConfig>) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(AwsConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&AwsConfig, AwsError> {
        self.config.as_ref().ok_or(AwsError::NotConfigured)
    }

    /// Initialize S3 client with the configured credentials
    async fn get_s3_client(&self) -> Result<(S3Client, String), AwsError> {
        let config = self.config()?;

        if config.s3_bucket_name.is_empty() {
            return Err(AwsError::InvalidConfig(
                "S3 bucket name not configured".to_string(),
            ));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "environment",
        );

        let region = Region::new(config.region.clone());

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = S3Client::new(&aws_config);

        Ok((client, config.s3_bucket_name.clone()))
    }

    /// Upload a file to S3 and return its public URL
    pub async fn upload_file(
        &self,
        file_data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, AwsError> {
        let (client, bucket) = self.get_s3_client().await?;

        let body = ByteStream::from(Bytes::from(file_data));

        client
            .put_object()
            .bucket(&bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, "Failed to upload file to S3");
                AwsError::S3Error(format!("Upload failed: {}", e))
            })?;

        let url = self.get_file_url(key)?;

        info!(key = %key, bucket = %bucket, "File uploaded to S3 successfully");
        Ok(url)
    }

    /// Delete a single file from S3
    pub async fn delete_file(&self, key: &str) -> Result<(), AwsError> {
        let (client, bucket) = self.get_s3_client().await?;

        client
            .delete_object()
            .bucket(&bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, "Failed to delete S3 object");
                AwsError::S3Error(format!("Delete failed: {}", e))
            })?;

        info!(key = %key, "File deleted from S3 successfully");
        Ok(())
    }

    /// Public URL for an object key
    pub fn get_file_url(&self, key: &str) -> Result<String, AwsError> {
        let config = self.config()?;

        let url = format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            config.s3_bucket_name, config.region, key
        );

        Ok(url)
    }

    /// Initialize SES client with the configured credentials
    async fn get_ses_client(&self) -> Result<SesClient, AwsError> {
        let config = self.config()?;

        if config.ses_from_email.is_empty() {
            return Err(AwsError::InvalidConfig(
                "SES from email not configured".to_string(),
            ));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "environment",
        );

        let region = Region::new(config.ses_region.clone());

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = SesClient::new(&aws_config);

        Ok(client)
    }

    /// Send an HTML email via SES
    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), AwsError> {
        let client = self.get_ses_client().await?;
        let config = self.config()?;

        use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};

        let destination = Destination::builder().to_addresses(to).build();

        let subject_content = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| AwsError::SesError(format!("Failed to build subject: {}", e)))?;

        let body_content = Content::builder()
            .data(body)
            .charset("UTF-8")
            .build()
            .map_err(|e| AwsError::SesError(format!("Failed to build body: {}", e)))?;

        let ses_body = SesBody::builder().html(body_content).build();

        let message = Message::builder()
            .subject(subject_content)
            .body(ses_body)
            .build();

        let email_content = EmailContent::builder().simple(message).build();

        let result = client
            .send_email()
            .from_email_address(&config.ses_from_email)
            .destination(destination)
            .content(email_content)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send email via SES");
                AwsError::SesError(format!("Send failed: {}", e))
            })?;

        info!(
            message_id = ?result.message_id(),
            "Email sent successfully via SES"
        );

        Ok(())
    }
}
