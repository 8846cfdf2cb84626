use async_trait::async_trait;
use sqlx::PgPool;

use parcelis_core::model::{OrderLine, OrderSnapshot};
use parcelis_core::repository::OrderGateway;

/// Read-only view over the order service's tables. Parcelis never writes
/// to them.
pub struct PostgresOrderGateway {
    pool: PgPool,
}

impl PostgresOrderGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_number: String,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    ship_street: String,
    ship_city: String,
    ship_zip: String,
    ship_country: String,
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    weight_grams: i32,
    quantity: i32,
}

#[async_trait]
impl OrderGateway for PostgresOrderGateway {
    async fn find_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderSnapshot>, Box<dyn std::error::Error + Send + Sync>> {
        let order: Option<OrderRow> = sqlx::query_as(
            "SELECT order_number, customer_name, customer_email, customer_phone, \
             ship_street, ship_city, ship_zip, ship_country \
             FROM orders WHERE order_number = $1",
        )
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines: Vec<OrderLineRow> = sqlx::query_as(
            "SELECT weight_grams, quantity FROM order_items WHERE order_number = $1",
        )
        .bind(order_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderSnapshot {
            order_number: order.order_number,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            ship_street: order.ship_street,
            ship_city: order.ship_city,
            ship_zip: order.ship_zip,
            ship_country: order.ship_country,
            lines: lines
                .into_iter()
                .map(|l| OrderLine {
                    weight_grams: l.weight_grams.max(0) as u32,
                    quantity: l.quantity.max(0) as u32,
                })
                .collect(),
        }))
    }
}
