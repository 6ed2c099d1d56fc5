//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `frameshop_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use frameshop_core::storage::StoreError;

fn is_connection_failure<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(err, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_))
}

fn throughput_exceeded() -> StoreError {
    StoreError::Throttled("Throughput exceeded, please retry".to_string())
}

fn request_limit_exceeded() -> StoreError {
    StoreError::Throttled("Request limit exceeded, please retry".to_string())
}

fn table_not_found() -> StoreError {
    StoreError::InvalidRequest("Table not found".to_string())
}

fn internal_server_error() -> StoreError {
    StoreError::QueryFailed("DynamoDB internal server error".to_string())
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    if is_connection_failure(&err) {
        return StoreError::ConnectionFailed(format!("GetItem: {err}"));
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => table_not_found(),
        GetItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        GetItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        GetItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::QueryFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a BatchGetItem SDK error to StoreError.
pub fn map_batch_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
) -> StoreError {
    if is_connection_failure(&err) {
        return StoreError::ConnectionFailed(format!("BatchGetItem: {err}"));
    }
    match err.into_service_error() {
        BatchGetItemError::ResourceNotFoundException(_) => table_not_found(),
        BatchGetItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        BatchGetItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        BatchGetItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::QueryFailed(format!("BatchGetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> StoreError {
    if is_connection_failure(&err) {
        return StoreError::ConnectionFailed(format!("Query: {err}"));
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => table_not_found(),
        QueryError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        QueryError::RequestLimitExceeded(_) => request_limit_exceeded(),
        QueryError::InternalServerError(_) => internal_server_error(),
        err => StoreError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> StoreError {
    if is_connection_failure(&err) {
        return StoreError::ConnectionFailed(format!("PutItem: {err}"));
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => {
            StoreError::Conflict("Condition check failed".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            StoreError::Conflict("Transaction conflict, please retry".to_string())
        }
        PutItemError::ResourceNotFoundException(_) => table_not_found(),
        PutItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        PutItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::InvalidRequest("Item collection size limit exceeded".to_string())
        }
        PutItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::QueryFailed(format!("PutItem failed: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
) -> StoreError {
    if is_connection_failure(&err) {
        return StoreError::ConnectionFailed(format!("UpdateItem: {err}"));
    }
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => {
            StoreError::NotFound("Item to update does not exist".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            StoreError::Conflict("Transaction conflict, please retry".to_string())
        }
        UpdateItemError::ResourceNotFoundException(_) => table_not_found(),
        UpdateItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        UpdateItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::InvalidRequest("Item collection size limit exceeded".to_string())
        }
        UpdateItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::QueryFailed(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map a BatchWriteItem SDK error to StoreError.
pub fn map_batch_write_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
) -> StoreError {
    if is_connection_failure(&err) {
        return StoreError::ConnectionFailed(format!("BatchWriteItem: {err}"));
    }
    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(_) => table_not_found(),
        BatchWriteItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        BatchWriteItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        BatchWriteItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::InvalidRequest("Item collection size limit exceeded".to_string())
        }
        BatchWriteItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::QueryFailed(format!("BatchWriteItem failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error to StoreError.
pub fn map_transact_write_items_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
) -> StoreError {
    if is_connection_failure(&err) {
        return StoreError::ConnectionFailed(format!("TransactWriteItems: {err}"));
    }
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(e) => {
            StoreError::TransactionCanceled(e.to_string())
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            StoreError::Conflict("Transaction in progress, please retry".to_string())
        }
        TransactWriteItemsError::ResourceNotFoundException(_) => table_not_found(),
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            throughput_exceeded()
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => request_limit_exceeded(),
        TransactWriteItemsError::InternalServerError(_) => internal_server_error(),
        err => StoreError::QueryFailed(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Map an SDK builder error (missing required field) to StoreError.
pub fn map_build_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidRequest(err.to_string())
}
