use std::sync::Arc;

use frameshop_core::shop::tables::ORDER_STATUS_INDEX;
use frameshop_core::shop::{normalize_text, Customer, Order, OrderDimensions, OrderStatus};
use frameshop_core::storage::{
    Cursor, Direction, IndexKey, KeySchema, KeyValue, KeyValues, KeyedStore, Page, Repository,
    DEFAULT_PAGE_SIZE,
};

use crate::error::{Result, ShopError};

/// Orders, keyed by customer and creation timestamp.
///
/// Soft-deleted orders stay stored but are hidden from lookups.
pub struct OrderRepository {
    repo: Repository<Order>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn KeyedStore>, table: impl Into<String>) -> Result<Self> {
        let schema = KeySchema::partition("customerUuid", |o: &Order| {
            KeyValue::non_empty(&o.customer_uuid)
        })
        .sorted_by("timestamp", |o: &Order| Some(KeyValue::Number(o.timestamp)));
        Ok(Self {
            repo: Repository::new(store, table, schema)?,
        })
    }

    pub async fn get_order_by_id(&self, uuid: &str) -> Result<Option<Order>> {
        let order = self.repo.get_by_uuid(uuid).await?;
        Ok(order.filter(|o| !o.deleted))
    }

    pub async fn get_order_by_short_id(&self, short_id: &str) -> Result<Option<Order>> {
        let order = self.repo.get_by_short_id(short_id).await?;
        Ok(order.filter(|o| !o.deleted))
    }

    /// Orders of a customer, oldest first.
    pub async fn get_orders_by_customer_id(&self, customer_uuid: &str) -> Result<Vec<Order>> {
        let orders = self
            .repo
            .get_by_partition_key(customer_uuid, Direction::Ascending)
            .await?;
        Ok(orders.into_iter().filter(|o| !o.deleted).collect())
    }

    /// One page of a customer's orders, newest first. Deleted orders are
    /// removed from the page after it is read.
    pub async fn get_orders_by_customer_paginated(
        &self,
        customer_uuid: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Order>> {
        let mut page = self
            .repo
            .get_by_partition_key_paginated(
                customer_uuid,
                Direction::Descending,
                cursor,
                DEFAULT_PAGE_SIZE,
            )
            .await?;
        page.elements.retain(|o| !o.deleted);
        Ok(page)
    }

    /// Orders of a store in a status, newest first.
    pub async fn get_orders_by_status(
        &self,
        status: OrderStatus,
        store_id: &str,
    ) -> Result<Vec<Order>> {
        let orders = self
            .repo
            .get_by_secondary_index_ordered(
                ORDER_STATUS_INDEX,
                "status",
                status.as_str(),
                Direction::Descending,
            )
            .await?;
        Ok(visible_in_store(orders, store_id))
    }

    /// Orders of a store in a status whose customer name contains `query`.
    pub async fn find_orders_by_status(
        &self,
        status: OrderStatus,
        query: &str,
        store_id: &str,
    ) -> Result<Vec<Order>> {
        let orders = self
            .repo
            .search_nested(
                status.as_str(),
                &normalize_text(query),
                "customer.normalizedName",
                Direction::Descending,
                Some(IndexKey::new(ORDER_STATUS_INDEX, "status")),
            )
            .await?;
        Ok(visible_in_store(orders, store_id))
    }

    /// Orders of a customer created within `[start, end]` (milliseconds).
    pub async fn get_orders_between(
        &self,
        customer_uuid: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Order>> {
        Ok(self
            .repo
            .get_by_sort_key_range(customer_uuid, start, end)
            .await?)
    }

    pub async fn create_order(&self, order: &Order) -> Result<()> {
        validate(order)?;
        self.repo.put(order).await?;
        tracing::info!(
            order_uuid = %order.uuid,
            short_id = %order.short_id,
            customer_uuid = %order.customer_uuid,
            "Order created"
        );
        Ok(())
    }

    pub async fn set_order_deleted(&self, order: &Order, deleted: bool) -> Result<()> {
        self.update(order, "deleted", deleted).await
    }

    pub async fn set_order_notified(&self, order: &Order) -> Result<()> {
        self.update(order, "notified", true).await
    }

    /// Persists `order.status`.
    pub async fn set_order_status(&self, order: &Order) -> Result<()> {
        self.update(order, "status", order.status).await
    }

    /// Persists `order.amount_payed`.
    pub async fn update_amount_payed(&self, order: &Order) -> Result<()> {
        self.update(order, "amountPayed", order.amount_payed).await
    }

    /// Replaces the whole dimensions block.
    pub async fn set_dimensions(&self, order: &Order, dimensions: &OrderDimensions) -> Result<()> {
        self.update(order, "dimensions", dimensions).await
    }

    /// Sets one measurement, e.g. `totalWidth`. The order must already have
    /// dimensions.
    pub async fn update_dimension(&self, order: &Order, name: &str, value: f64) -> Result<()> {
        self.repo
            .update_nested_field(
                order.customer_uuid.as_str(),
                &format!("dimensions.{name}"),
                value,
                Some(KeyValue::Number(order.timestamp)),
            )
            .await?;
        Ok(())
    }

    pub async fn store_orders(&self, orders: &[Order]) -> Result<()> {
        Ok(self.repo.batch_put(orders).await?)
    }

    pub async fn delete_order(&self, customer_uuid: &str, timestamp: i64) -> Result<()> {
        let key = KeyValues::new(customer_uuid, Some(KeyValue::Number(timestamp)));
        Ok(self.repo.batch_delete(&[key]).await?)
    }

    /// Stores `new` in place of `old`, moving it if its key changed.
    pub async fn update_full_order(&self, old: &Order, new: &Order) -> Result<()> {
        validate(new)?;
        self.repo.replace_key(old, new).await?;
        Ok(())
    }

    /// Moves an order to another customer and returns the relinked order.
    pub async fn link_to_customer(&self, order: &Order, customer: &Customer) -> Result<Order> {
        let relinked = order.relinked_to(customer);
        self.update_full_order(order, &relinked).await?;
        tracing::info!(
            order_uuid = %order.uuid,
            from = %order.customer_uuid,
            to = %relinked.customer_uuid,
            "Order linked to customer"
        );
        Ok(relinked)
    }

    async fn update(
        &self,
        order: &Order,
        field: &str,
        value: impl serde::Serialize,
    ) -> Result<()> {
        self.repo
            .update_field(
                order.customer_uuid.as_str(),
                field,
                value,
                Some(KeyValue::Number(order.timestamp)),
            )
            .await?;
        Ok(())
    }
}

fn visible_in_store(orders: Vec<Order>, store_id: &str) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|o| !o.deleted && o.store_id == store_id)
        .collect()
}

fn validate(order: &Order) -> Result<()> {
    if order.uuid.trim().is_empty() {
        return Err(ShopError::invalid("order", "uuid is empty"));
    }
    if order.customer_uuid.trim().is_empty() {
        return Err(ShopError::invalid("order", "customerUuid is empty"));
    }
    if order.store_id.trim().is_empty() {
        return Err(ShopError::invalid("order", "storeId is empty"));
    }
    if order.timestamp <= 0 {
        return Err(ShopError::invalid("order", "timestamp must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use frameshop_core::shop::tables::ORDER;
    use frameshop_core::storage::RepositoryError;

    use super::*;
    use crate::repositories::testing;

    fn order() -> Order {
        Order::new(&Customer::new("S1", "600111222", "Ana"), "U1")
    }

    fn repository() -> OrderRepository {
        OrderRepository::new(testing::store(), testing::table(ORDER)).unwrap()
    }

    fn order_at(customer: &Customer, timestamp: i64) -> Order {
        Order::new(customer, "U1").with_timestamp(timestamp)
    }

    fn timestamps(orders: &[Order]) -> Vec<i64> {
        orders.iter().map(|o| o.timestamp).collect()
    }

    #[test]
    fn test_validate_order() {
        assert!(validate(&order()).is_ok());
        assert!(validate(&order().with_timestamp(0)).is_err());

        let mut no_store = order();
        no_store.store_id.clear();
        assert!(matches!(
            validate(&no_store),
            Err(ShopError::Validation { entity: "order", .. })
        ));
    }

    #[test]
    fn test_visible_in_store() {
        let kept = order();
        let mut deleted = order();
        deleted.deleted = true;
        let mut other_store = order();
        other_store.store_id = "S2".to_string();

        let visible = visible_in_store(vec![kept.clone(), deleted, other_store], "S1");
        assert_eq!(visible, vec![kept]);
    }

    #[tokio::test]
    async fn test_lookups_hide_deleted_orders() {
        let repo = repository();
        let order = order();
        repo.create_order(&order).await.unwrap();

        assert_eq!(
            repo.get_order_by_short_id(&order.short_id).await.unwrap(),
            Some(order.clone())
        );

        repo.set_order_deleted(&order, true).await.unwrap();
        assert!(repo.get_order_by_id(&order.uuid).await.unwrap().is_none());
        assert!(repo
            .get_order_by_short_id(&order.short_id)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .get_orders_by_customer_id(&order.customer_uuid)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_orders_by_status_are_newest_first_per_store() {
        let repo = repository();
        let ana = Customer::new("S1", "600000001", "Ana");
        let luis = Customer::new("S1", "600000002", "Luis");
        let other_store = Customer::new("S2", "600000003", "Eva");

        let mut finished = order_at(&luis, 400);
        finished.status = OrderStatus::Finished;
        repo.store_orders(&[
            order_at(&ana, 100),
            order_at(&luis, 300),
            order_at(&ana, 200),
            order_at(&other_store, 500),
            finished,
        ])
        .await
        .unwrap();

        let pending = repo
            .get_orders_by_status(OrderStatus::Pending, "S1")
            .await
            .unwrap();
        assert_eq!(timestamps(&pending), vec![300, 200, 100]);

        let found = repo
            .find_orders_by_status(OrderStatus::Pending, "ANA", "S1")
            .await
            .unwrap();
        assert_eq!(timestamps(&found), vec![200, 100]);
    }

    #[tokio::test]
    async fn test_status_change_moves_order_between_indexes() {
        let repo = repository();
        let mut order = order().with_timestamp(1_000);
        repo.create_order(&order).await.unwrap();

        order.status = OrderStatus::Finished;
        repo.set_order_status(&order).await.unwrap();

        assert!(repo
            .get_orders_by_status(OrderStatus::Pending, "S1")
            .await
            .unwrap()
            .is_empty());
        let finished = repo
            .get_orders_by_status(OrderStatus::Finished, "S1")
            .await
            .unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].uuid, order.uuid);
    }

    #[tokio::test]
    async fn test_orders_between_is_inclusive() {
        let repo = repository();
        let customer = Customer::new("S1", "600111222", "Ana");
        let orders = [100, 200, 300, 400]
            .into_iter()
            .map(|t| order_at(&customer, t))
            .collect::<Vec<_>>();
        repo.store_orders(&orders).await.unwrap();

        let between = repo
            .get_orders_between(&customer.uuid, 200, 300)
            .await
            .unwrap();
        assert_eq!(timestamps(&between), vec![200, 300]);
    }

    #[tokio::test]
    async fn test_customer_pages_are_newest_first() {
        let repo = repository();
        let customer = Customer::new("S1", "600111222", "Ana");
        let orders = (1..=30)
            .map(|t| order_at(&customer, t))
            .collect::<Vec<_>>();
        repo.store_orders(&orders).await.unwrap();

        let first = repo
            .get_orders_by_customer_paginated(&customer.uuid, None)
            .await
            .unwrap();
        assert_eq!(first.elements.len(), DEFAULT_PAGE_SIZE);
        assert_eq!(first.elements[0].timestamp, 30);

        let second = repo
            .get_orders_by_customer_paginated(&customer.uuid, first.next_cursor.as_ref())
            .await
            .unwrap();
        assert_eq!(timestamps(&second.elements), vec![5, 4, 3, 2, 1]);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_field_updates() {
        let repo = repository();
        let mut order = order();
        repo.create_order(&order).await.unwrap();

        order.amount_payed = 25.5;
        repo.update_amount_payed(&order).await.unwrap();
        repo.set_order_notified(&order).await.unwrap();
        repo.set_dimensions(
            &order,
            &OrderDimensions {
                total_width: 40.0,
                total_height: 50.0,
                ..OrderDimensions::default()
            },
        )
        .await
        .unwrap();
        repo.update_dimension(&order, "workingWidth", 35.0)
            .await
            .unwrap();

        let stored = repo.get_order_by_id(&order.uuid).await.unwrap().unwrap();
        assert_eq!(stored.amount_payed, 25.5);
        assert!(stored.notified);
        let dimensions = stored.dimensions.unwrap();
        assert_eq!(dimensions.total_width, 40.0);
        assert_eq!(dimensions.working_width, 35.0);
    }

    #[tokio::test]
    async fn test_key_fields_cannot_be_updated() {
        let repo = repository();
        let order = order();
        repo.create_order(&order).await.unwrap();

        let result = repo.update(&order, "customerUuid", "someone-else").await;
        assert!(matches!(
            result,
            Err(ShopError::Repository(RepositoryError::ImmutableKey { .. }))
        ));
    }

    #[tokio::test]
    async fn test_link_to_customer_moves_order() {
        let repo = repository();
        let ana = Customer::new("S1", "600000001", "Ana");
        let luis = Customer::new("S1", "600000002", "Luis");
        let order = order_at(&ana, 100);
        repo.create_order(&order).await.unwrap();

        let relinked = repo.link_to_customer(&order, &luis).await.unwrap();
        assert_eq!(relinked.customer_uuid, luis.uuid);
        assert_eq!(relinked.customer.name, "Luis");

        assert!(repo
            .get_orders_by_customer_id(&ana.uuid)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.get_orders_by_customer_id(&luis.uuid).await.unwrap(),
            vec![relinked]
        );
    }

    #[tokio::test]
    async fn test_delete_order() {
        let repo = repository();
        let order = order();
        repo.create_order(&order).await.unwrap();
        repo.delete_order(&order.customer_uuid, order.timestamp)
            .await
            .unwrap();
        assert!(repo
            .get_orders_by_customer_id(&order.customer_uuid)
            .await
            .unwrap()
            .is_empty());
    }
}
