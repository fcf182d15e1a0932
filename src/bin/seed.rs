use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use axum_commerce_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    ensure_user(&orm, "dhina", "dhina@example.com", "dhina123").await?;
    ensure_user(&orm, "john_doe", "john@example.com", "john123").await?;
    ensure_user(&orm, "alice_smith", "alice@example.com", "alice123").await?;
    seed_products(&orm).await?;

    println!("Seed completed");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email}");
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let products: Vec<(&str, i64, i32)> = vec![
        ("Laptop", 80_000_00, 10),
        ("Headphones", 3_000_00, 50),
        ("Phone", 45_000_00, 15),
        ("Tablet", 35_000_00, 8),
        ("Monitor", 25_000_00, 20),
    ];

    for (name, price, available_quantity) in products {
        let exists = Products::find()
            .filter(ProdCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            price: Set(price),
            available_quantity: Set(available_quantity),
            version: Set(1),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
