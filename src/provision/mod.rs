//! Provisioning bootstrap for the backing AWS resources.
//!
//! Ensure-or-create semantics for the image bucket, the user pool and
//! its app client, and the appointments table. Every step first checks
//! for an existing resource by name, so the bootstrap is safe to run
//! repeatedly and tolerates partially provisioned environments (bucket
//! present, pool missing, and so on).
//!
//! Runs ahead of request handling (or standalone via the `provision`
//! subcommand) and returns the resolved identifiers; nothing here is
//! touched again once the server is up.

use aws_sdk_cognitoidentityprovider::types::{
    AttributeDataType, ExplicitAuthFlowsType, PasswordPolicyType, SchemaAttributeType,
    UserPoolMfaType, UserPoolPolicyType, VerifiedAttributeType,
};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ProvisionedThroughput, ScalarAttributeType, TableStatus,
};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::aws::AwsClients;
use crate::error::ProvisionError;
use crate::store::{OWNER_EMAIL_INDEX, SLOT_INDEX};

/// How many times to poll a freshly created table for ACTIVE status.
const TABLE_POLL_ATTEMPTS: u32 = 30;

/// Delay between table status polls.
const TABLE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Identifiers of the provisioned resources.
///
/// Resolved once at startup and passed into the adapters; there is no
/// process-wide mutable configuration.
#[derive(Debug, Clone)]
pub struct ProvisionedResources {
    pub bucket: String,
    pub user_pool_id: String,
    pub app_client_id: String,
    pub table: String,
}

/// Names and settings the bootstrap works from.
#[derive(Debug, Clone)]
pub struct ProvisionSpec {
    pub bucket: String,
    pub user_pool_name: String,
    pub app_client_name: String,
    pub table: String,
    pub region: String,
}

/// Idempotent ensure-or-create for all backing resources.
pub struct Provisioner<'a> {
    clients: &'a AwsClients,
    spec: ProvisionSpec,
}

impl<'a> Provisioner<'a> {
    pub fn new(clients: &'a AwsClients, spec: ProvisionSpec) -> Self {
        Self { clients, spec }
    }

    /// Ensure every resource exists, creating what is missing.
    pub async fn ensure_all(&self) -> Result<ProvisionedResources, ProvisionError> {
        let bucket = self.ensure_bucket().await?;
        let user_pool_id = self.ensure_user_pool().await?;
        let app_client_id = self.ensure_app_client(&user_pool_id).await?;
        let table = self.ensure_table().await?;

        Ok(ProvisionedResources {
            bucket,
            user_pool_id,
            app_client_id,
            table,
        })
    }

    // =========================================================================
    // S3 Bucket
    // =========================================================================

    /// Ensure the image bucket exists.
    pub async fn ensure_bucket(&self) -> Result<String, ProvisionError> {
        let name = &self.spec.bucket;

        let head = self.clients.s3.head_bucket().bucket(name).send().await;
        match head {
            Ok(_) => {
                info!("bucket '{}' already exists", name);
                return Ok(name.clone());
            }
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|service_error| service_error.is_not_found())
                    .unwrap_or(false);
                if !not_found {
                    return Err(ProvisionError::Bucket {
                        name: name.clone(),
                        detail: format!("{:?}", e),
                    });
                }
            }
        }

        let mut request = self.clients.s3.create_bucket().bucket(name);

        // us-east-1 rejects an explicit location constraint
        if self.spec.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.spec.region.as_str(),
                    ))
                    .build(),
            );
        }

        request.send().await.map_err(|e| ProvisionError::Bucket {
            name: name.clone(),
            detail: format!("{:?}", e),
        })?;

        info!("created bucket '{}'", name);
        Ok(name.clone())
    }

    // =========================================================================
    // Cognito User Pool
    // =========================================================================

    /// Look up the user pool by name without creating it.
    pub async fn find_user_pool(&self) -> Result<Option<String>, ProvisionError> {
        let name = &self.spec.user_pool_name;

        let pools = self
            .clients
            .cognito
            .list_user_pools()
            .max_results(60)
            .send()
            .await
            .map_err(|e| ProvisionError::UserPool {
                name: name.clone(),
                detail: format!("{:?}", e),
            })?;

        let id = pools
            .user_pools()
            .iter()
            .find(|pool| pool.name() == Some(name.as_str()))
            .and_then(|pool| pool.id())
            .map(|id| id.to_string());

        Ok(id)
    }

    /// Ensure the user pool exists, matching by pool name.
    pub async fn ensure_user_pool(&self) -> Result<String, ProvisionError> {
        let name = &self.spec.user_pool_name;

        if let Some(id) = self.find_user_pool().await? {
            info!("user pool '{}' already exists ({})", name, id);
            return Ok(id);
        }

        let password_policy = PasswordPolicyType::builder()
            .minimum_length(8)
            .require_uppercase(true)
            .require_lowercase(true)
            .require_numbers(true)
            .require_symbols(true)
            .build();

        let created = self
            .clients
            .cognito
            .create_user_pool()
            .pool_name(name)
            .policies(
                UserPoolPolicyType::builder()
                    .password_policy(password_policy)
                    .build(),
            )
            .auto_verified_attributes(VerifiedAttributeType::Email)
            .mfa_configuration(UserPoolMfaType::Off)
            .schema(
                SchemaAttributeType::builder()
                    .name("email")
                    .attribute_data_type(AttributeDataType::String)
                    .required(true)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| ProvisionError::UserPool {
                name: name.clone(),
                detail: format!("{:?}", e),
            })?;

        let id = created
            .user_pool()
            .and_then(|pool| pool.id())
            .ok_or_else(|| ProvisionError::UserPool {
                name: name.clone(),
                detail: "pool created without an id".to_string(),
            })?;

        info!("created user pool '{}' ({})", name, id);
        Ok(id.to_string())
    }

    /// Look up the app client by name without creating it.
    pub async fn find_app_client(
        &self,
        user_pool_id: &str,
    ) -> Result<Option<String>, ProvisionError> {
        let name = &self.spec.app_client_name;

        let clients = self
            .clients
            .cognito
            .list_user_pool_clients()
            .user_pool_id(user_pool_id)
            .max_results(60)
            .send()
            .await
            .map_err(|e| ProvisionError::AppClient {
                name: name.clone(),
                detail: format!("{:?}", e),
            })?;

        let id = clients
            .user_pool_clients()
            .iter()
            .find(|client| client.client_name() == Some(name.as_str()))
            .and_then(|client| client.client_id())
            .map(|id| id.to_string());

        Ok(id)
    }

    /// Ensure the app client exists in the pool, matching by client name.
    pub async fn ensure_app_client(&self, user_pool_id: &str) -> Result<String, ProvisionError> {
        let name = &self.spec.app_client_name;

        if let Some(id) = self.find_app_client(user_pool_id).await? {
            info!("app client '{}' already exists", name);
            return Ok(id);
        }

        let created = self
            .clients
            .cognito
            .create_user_pool_client()
            .user_pool_id(user_pool_id)
            .client_name(name)
            .generate_secret(false)
            .explicit_auth_flows(ExplicitAuthFlowsType::AllowUserPasswordAuth)
            .explicit_auth_flows(ExplicitAuthFlowsType::AllowRefreshTokenAuth)
            .send()
            .await
            .map_err(|e| ProvisionError::AppClient {
                name: name.clone(),
                detail: format!("{:?}", e),
            })?;

        let id = created
            .user_pool_client()
            .and_then(|client| client.client_id())
            .ok_or_else(|| ProvisionError::AppClient {
                name: name.clone(),
                detail: "client created without an id".to_string(),
            })?;

        info!("created app client '{}'", name);
        Ok(id.to_string())
    }

    // =========================================================================
    // DynamoDB Table
    // =========================================================================

    /// Ensure the appointments table and its indexes exist.
    pub async fn ensure_table(&self) -> Result<String, ProvisionError> {
        let name = &self.spec.table;

        let describe = self
            .clients
            .dynamodb
            .describe_table()
            .table_name(name)
            .send()
            .await;

        match describe {
            Ok(_) => {
                info!("table '{}' already exists", name);
                return Ok(name.clone());
            }
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|service_error| service_error.is_resource_not_found_exception())
                    .unwrap_or(false);
                if !not_found {
                    return Err(ProvisionError::Table {
                        name: name.clone(),
                        detail: format!("{:?}", e),
                    });
                }
            }
        }

        self.create_table().await?;
        self.wait_for_table_active().await?;

        info!("created table '{}'", name);
        Ok(name.clone())
    }

    async fn create_table(&self) -> Result<(), ProvisionError> {
        let name = &self.spec.table;
        let table_error = |detail: String| ProvisionError::Table {
            name: name.clone(),
            detail,
        };

        let throughput = || {
            ProvisionedThroughput::builder()
                .read_capacity_units(5)
                .write_capacity_units(5)
                .build()
        };

        let hash_key = |attribute: &str| {
            KeySchemaElement::builder()
                .attribute_name(attribute)
                .key_type(KeyType::Hash)
                .build()
        };

        let range_key = |attribute: &str| {
            KeySchemaElement::builder()
                .attribute_name(attribute)
                .key_type(KeyType::Range)
                .build()
        };

        let string_attribute = |attribute: &str| {
            AttributeDefinition::builder()
                .attribute_name(attribute)
                .attribute_type(ScalarAttributeType::S)
                .build()
        };

        let all_projection = Projection::builder()
            .projection_type(ProjectionType::All)
            .build();

        let owner_index = GlobalSecondaryIndex::builder()
            .index_name(OWNER_EMAIL_INDEX)
            .key_schema(hash_key("ownerEmail").map_err(|e| table_error(e.to_string()))?)
            .projection(all_projection.clone())
            .provisioned_throughput(throughput().map_err(|e| table_error(e.to_string()))?)
            .build()
            .map_err(|e| table_error(e.to_string()))?;

        let slot_index = GlobalSecondaryIndex::builder()
            .index_name(SLOT_INDEX)
            .key_schema(hash_key("date").map_err(|e| table_error(e.to_string()))?)
            .key_schema(range_key("time").map_err(|e| table_error(e.to_string()))?)
            .projection(all_projection)
            .provisioned_throughput(throughput().map_err(|e| table_error(e.to_string()))?)
            .build()
            .map_err(|e| table_error(e.to_string()))?;

        self.clients
            .dynamodb
            .create_table()
            .table_name(name)
            .key_schema(hash_key("appointmentId").map_err(|e| table_error(e.to_string()))?)
            .attribute_definitions(
                string_attribute("appointmentId").map_err(|e| table_error(e.to_string()))?,
            )
            .attribute_definitions(
                string_attribute("ownerEmail").map_err(|e| table_error(e.to_string()))?,
            )
            .attribute_definitions(string_attribute("date").map_err(|e| table_error(e.to_string()))?)
            .attribute_definitions(string_attribute("time").map_err(|e| table_error(e.to_string()))?)
            .global_secondary_indexes(owner_index)
            .global_secondary_indexes(slot_index)
            .provisioned_throughput(throughput().map_err(|e| table_error(e.to_string()))?)
            .send()
            .await
            .map_err(|e| table_error(format!("{:?}", e)))?;

        Ok(())
    }

    /// Poll until the freshly created table reports ACTIVE.
    async fn wait_for_table_active(&self) -> Result<(), ProvisionError> {
        let name = &self.spec.table;

        for _ in 0..TABLE_POLL_ATTEMPTS {
            let described = self
                .clients
                .dynamodb
                .describe_table()
                .table_name(name)
                .send()
                .await;

            if let Ok(output) = described {
                let active = output
                    .table()
                    .and_then(|table| table.table_status())
                    .map(|status| *status == TableStatus::Active)
                    .unwrap_or(false);
                if active {
                    return Ok(());
                }
            }

            sleep(TABLE_POLL_INTERVAL).await;
        }

        Err(ProvisionError::TableNotActive {
            name: name.clone(),
            attempts: TABLE_POLL_ATTEMPTS,
        })
    }
}
