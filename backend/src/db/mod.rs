use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Resolve an active tenant's id from its slug.
pub async fn tenant_id_for_slug(pool: &PgPool, slug: &str) -> anyhow::Result<Option<uuid::Uuid>> {
    let id = sqlx::query_scalar(
        "SELECT id FROM public.tenants WHERE slug = $1 AND is_active = TRUE",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}
