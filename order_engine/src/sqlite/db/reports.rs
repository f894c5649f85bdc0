use std::collections::HashMap;

use log::trace;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};
use storefront_common::Amount;

use crate::{
    db_types::ProductId,
    order_objects::{ProductSales, SalesQuery},
};

#[derive(Debug, FromRow)]
struct SoldItem {
    product_id: ProductId,
    name: String,
    quantity: i64,
    price_at_purchase: Amount,
}

/// Aggregates line items sold in the query window, per product, highest revenue first.
///
/// Prices are stored as exact decimal text, so the sums are calculated here rather than with SQL `SUM`, which would
/// go through floating point.
pub async fn sales_report(query: SalesQuery, conn: &mut SqliteConnection) -> Result<Vec<ProductSales>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT
        li.product_id AS product_id,
        COALESCE(p.name, '') AS name,
        li.quantity AS quantity,
        li.price_at_purchase AS price_at_purchase
    FROM order_line_items li
        JOIN orders o ON li.order_id = o.id
        LEFT JOIN products p ON li.product_id = p.id
    WHERE "#,
    );
    let mut where_clause = builder.separated(" AND ");
    where_clause.push("o.created_at >= ");
    where_clause.push_bind_unseparated(query.from);
    where_clause.push("o.created_at <= ");
    where_clause.push_bind_unseparated(query.to);
    if let Some(user_id) = query.user_id {
        where_clause.push("o.user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(status) = query.status {
        where_clause.push("o.status = ");
        where_clause.push_bind_unseparated(status);
    }
    builder.push(" ORDER BY li.product_id");
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<SoldItem>().fetch_all(conn).await?;

    let mut totals: HashMap<ProductId, ProductSales> = HashMap::new();
    for row in rows {
        let entry = totals.entry(row.product_id).or_insert_with(|| ProductSales {
            product_id: row.product_id,
            name: row.name.clone(),
            total_quantity: 0,
            total_revenue: Amount::zero(),
        });
        entry.total_quantity += row.quantity;
        entry.total_revenue += row.price_at_purchase * row.quantity;
    }
    let mut report = totals.into_values().collect::<Vec<_>>();
    report.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue).then(a.product_id.cmp(&b.product_id)));
    Ok(report)
}
