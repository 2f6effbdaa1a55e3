//! Admin handlers: dashboard, categories and products.
//!
//! Every handler takes [`RequireAdmin`]; customers are sent back to `/`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::catalog::{DATE_FORMAT, ProductFields};
use stockroom_core::{CategoryId, ProductId};

use crate::db::Store;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryWithProducts, Product};
use crate::routes::{PageContext, redirect_with_notice};
use crate::services::catalog::{CatalogError, CatalogService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// New category form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

/// Product form data, shared by add and edit.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub quantity: String,
    pub price: String,
    pub category_id: String,
    pub manufactured_on: String,
}

impl ProductForm {
    fn fields(&self) -> ProductFields<'_> {
        ProductFields {
            name: &self.name,
            quantity: &self.quantity,
            price: &self.price,
            category_id: &self.category_id,
            manufactured_on: &self.manufactured_on,
        }
    }
}

/// Query for preselecting a category on the add-product form.
#[derive(Debug, Deserialize)]
pub struct AddProductQuery {
    pub category_id: Option<i32>,
}

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub categories: Vec<Category>,
}

/// Add category template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/category_add.html")]
pub struct AddCategoryTemplate {
    pub page: PageContext,
}

/// Category detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/category_show.html")]
pub struct ShowCategoryTemplate {
    pub page: PageContext,
    pub category: CategoryWithProducts,
}

/// Add/edit product template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub action: String,
    pub heading: &'static str,
    pub categories: Vec<CategoryOption>,
    pub form: ProductForm,
    /// Quantity is only set when creating.
    pub editing: bool,
}

/// One entry of the category select.
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
    pub selected: bool,
}

fn category_options(categories: Vec<Category>, selected: Option<CategoryId>) -> Vec<CategoryOption> {
    categories
        .into_iter()
        .map(|category| CategoryOption {
            selected: selected == Some(category.id),
            id: category.id,
            name: category.name,
        })
        .collect()
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display the admin dashboard.
pub async fn dashboard<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
) -> Result<DashboardTemplate, AppError> {
    let categories = CatalogService::new(state.store()).categories().await?;
    Ok(DashboardTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        categories,
    })
}

// =============================================================================
// Categories
// =============================================================================

/// Display the add-category form.
pub async fn add_category_page<S: Store>(
    RequireAdmin(user): RequireAdmin,
    session: Session,
) -> AddCategoryTemplate {
    AddCategoryTemplate {
        page: PageContext::load(&session, Some(&user)).await,
    }
}

/// Handle add-category form submission.
#[instrument(skip_all, fields(admin_id = %user.id))]
pub async fn add_category<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    match CatalogService::new(state.store())
        .create_category(&form.name)
        .await
    {
        Ok(_) => Ok(redirect_with_notice(&session, "/admin", "Category added.").await),
        Err(e @ CatalogError::InvalidCategory(_)) => {
            Ok(redirect_with_notice(&session, "/category/add", &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Display one category with its products.
pub async fn show_category<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<ShowCategoryTemplate, AppError> {
    let category = CatalogService::new(state.store()).category(id).await?;
    Ok(ShowCategoryTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        category,
    })
}

// =============================================================================
// Products
// =============================================================================

/// Display the add-product form, optionally preselecting a category.
pub async fn add_product_page<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Query(query): Query<AddProductQuery>,
) -> Result<ProductFormTemplate, AppError> {
    let categories = CatalogService::new(state.store()).categories().await?;
    Ok(ProductFormTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        action: "/product/add".to_string(),
        heading: "Add product",
        categories: category_options(categories, query.category_id.map(CategoryId::new)),
        form: ProductForm {
            manufactured_on: chrono::Local::now().format(DATE_FORMAT).to_string(),
            ..ProductForm::default()
        },
        editing: false,
    })
}

/// Handle add-product form submission.
#[instrument(skip_all, fields(admin_id = %user.id))]
pub async fn add_product<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    match CatalogService::new(state.store())
        .create_product(form.fields())
        .await
    {
        Ok(_) => Ok(redirect_with_notice(&session, "/admin", "Product added.").await),
        Err(e @ CatalogError::InvalidProduct(_)) => {
            let back = match form.category_id.trim().parse::<i32>() {
                Ok(id) => format!("/product/add?category_id={id}"),
                Err(_) => "/product/add".to_string(),
            };
            Ok(redirect_with_notice(&session, &back, &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Display the edit form for a product.
pub async fn edit_product_page<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate, AppError> {
    let catalog = CatalogService::new(state.store());
    let product = catalog.product(id).await?;
    let categories = catalog.categories().await?;
    Ok(ProductFormTemplate {
        page: PageContext::load(&session, Some(&user)).await,
        action: format!("/product/{id}/edit"),
        heading: "Edit product",
        categories: category_options(categories, Some(product.category_id)),
        form: product_form(&product),
        editing: true,
    })
}

/// Handle product edit form submission.
#[instrument(skip_all, fields(admin_id = %user.id, product_id = %id))]
pub async fn edit_product<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    match CatalogService::new(state.store())
        .update_product(id, form.fields())
        .await
    {
        Ok(product) => {
            let to = format!("/category/{}/show", product.category_id);
            Ok(redirect_with_notice(&session, &to, "Product updated.").await)
        }
        Err(e @ CatalogError::InvalidProduct(_)) => {
            let back = format!("/product/{id}/edit");
            Ok(redirect_with_notice(&session, &back, &e.to_string()).await)
        }
        Err(e) => Err(e.into()),
    }
}

fn product_form(product: &Product) -> ProductForm {
    ProductForm {
        name: product.name.clone(),
        quantity: product.quantity.to_string(),
        price: product.price.to_string(),
        category_id: product.category_id.to_string(),
        manufactured_on: product.manufactured_on.format(DATE_FORMAT).to_string(),
    }
}
