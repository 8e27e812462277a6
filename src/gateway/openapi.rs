//! OpenAPI / Swagger UI documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::{
    AccountApiData, DepositApiRequest, HealthResponse, LedgerEntryApiData, TransferApiRequest,
    TransferApiResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ledgercore API",
        version = "1.0.0",
        description = "Atomic money-transfer core for the retail-banking dashboard.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::transfer::create_transfer,
        crate::gateway::handlers::transfer::get_transfer,
        crate::gateway::handlers::account::list_accounts,
        crate::gateway::handlers::account::get_ledger,
        crate::gateway::handlers::account::create_deposit,
    ),
    components(schemas(
        HealthResponse,
        TransferApiRequest,
        TransferApiResponse,
        AccountApiData,
        LedgerEntryApiData,
        DepositApiRequest,
    )),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Transfer", description = "Paired debit/credit movements"),
        (name = "Account", description = "Account and ledger queries")
    )
)]
pub struct ApiDoc;
