//! Admin and super-admin console flows against the backend.

mod common;

use common::{ADMIN_EMAIL, SHOPPER_EMAIL, SUPER_EMAIL, location, spawn};

#[tokio::test]
async fn admin_dashboard_lists_customers() {
    let app = spawn().await;
    app.login_as(ADMIN_EMAIL).await;

    let body = app.get("/admin").await.text().await.unwrap();
    // Shoppers only - fellow staff accounts are not customer rows.
    assert!(body.contains("ada@example.com"));
    assert!(!body.contains("boss@example.com"));
}

#[tokio::test]
async fn admin_views_a_customer_cart_on_demand() {
    let app = spawn().await;
    app.backend.seed_cart_line(SHOPPER_EMAIL, "c1", "p1", 2);
    app.login_as(ADMIN_EMAIL).await;
    app.backend.clear_calls();

    let body = app.get("/admin/carts/u1").await.text().await.unwrap();
    assert!(body.contains("Widget"));
    assert!(body.contains("Quantity: 2"));
    // $19.99 x 2, fetched specifically for this customer
    assert!(body.contains("$39.98"));
    assert_eq!(app.backend.count_calls("GET /api/cart/u1"), 1);
}

#[tokio::test]
async fn admin_creates_a_product_without_an_image_file() {
    let app = spawn().await;
    app.login_as(ADMIN_EMAIL).await;

    let form = reqwest::multipart::Form::new()
        .text("name", "Sprocket")
        .text("description", "Brand new")
        .text("price", "12.50")
        .text("stock", "7")
        .text("category", "Hardware")
        .text("image_url", "");

    let response = app
        .client
        .post(app.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 303);
    assert!(location(&response).contains("Product%20created"));
    assert_eq!(app.backend.count_calls("POST /api/products"), 1);

    // The catalog snapshot was invalidated, so the new product shows up.
    let body = app.get("/").await.text().await.unwrap();
    assert!(body.contains("Sprocket"));
}

#[tokio::test]
async fn product_form_rejects_a_bad_price() {
    let app = spawn().await;
    app.login_as(ADMIN_EMAIL).await;

    let form = reqwest::multipart::Form::new()
        .text("name", "Sprocket")
        .text("description", "")
        .text("price", "twelve")
        .text("stock", "7");

    let response = app
        .client
        .post(app.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert!(location(&response).contains("Price%20must%20be%20a%20number"));
    assert_eq!(app.backend.count_calls("POST /api/products"), 0);
}

#[tokio::test]
async fn admin_cannot_delete_products() {
    let app = spawn().await;
    app.login_as(ADMIN_EMAIL).await;
    app.backend.clear_calls();

    let response = app.post_form("/admin/products/p1/delete", &[]).await;

    assert!(location(&response).contains("Unauthorized%20action"));
    assert_eq!(app.backend.count_calls("DELETE /api/products"), 0);
}

#[tokio::test]
async fn superadmin_deletes_a_product() {
    let app = spawn().await;
    app.login_as(SUPER_EMAIL).await;

    let response = app.post_form("/superadmin/products/p1/delete", &[]).await;

    assert!(location(&response).contains("Product%20deleted"));
    assert_eq!(app.backend.count_calls("DELETE /api/products/p1"), 1);

    let body = app.get("/").await.text().await.unwrap();
    assert!(!body.contains("Widget"));
}

#[tokio::test]
async fn superadmin_dashboard_shows_all_cart_activity() {
    let app = spawn().await;
    app.backend.seed_cart_line(SHOPPER_EMAIL, "c1", "p1", 3);
    app.login_as(SUPER_EMAIL).await;

    let body = app.get("/superadmin?tab=carts").await.text().await.unwrap();
    assert!(body.contains("ada@example.com"));
    assert!(body.contains("Widget"));
    assert!(body.contains("$59.97"));
}

#[tokio::test]
async fn superadmin_provisions_an_admin_account() {
    let app = spawn().await;
    app.login_as(SUPER_EMAIL).await;

    let response = app
        .post_form(
            "/superadmin/admins",
            &[
                ("name", "New Admin"),
                ("email", "newadmin@example.com"),
                ("password", "longenough1"),
            ],
        )
        .await;

    assert!(location(&response).contains("Admin%20created%20successfully"));
    assert_eq!(app.backend.count_calls("POST /api/auth/create-admin"), 1);

    // The provisioned account can log straight into the admin console.
    let login = app
        .post_form(
            "/login",
            &[("email", "newadmin@example.com"), ("password", "longenough1")],
        )
        .await;
    assert_eq!(location(&login), "/admin");
}

#[tokio::test]
async fn superadmin_lists_every_account() {
    let app = spawn().await;
    app.login_as(SUPER_EMAIL).await;

    let body = app.get("/superadmin?tab=users").await.text().await.unwrap();
    assert!(body.contains("ada@example.com"));
    assert!(body.contains("root@example.com"));
    assert!(body.contains("boss@example.com"));
}
