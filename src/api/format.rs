//! Projections from stored entities to the public wire format, one explicit
//! function per representation variant.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::models::{Attribute, Recipe, User};

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: i64,
    pub email: String,
    pub name: String,
}

pub fn user_out(user: &User) -> UserOut {
    UserOut {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct AttributeOut {
    pub id: i64,
    pub name: String,
}

pub fn attribute_out(attribute: &Attribute) -> AttributeOut {
    AttributeOut {
        id: attribute.id,
        name: attribute.name.clone(),
    }
}

pub fn attributes_out(attributes: &[Attribute]) -> Vec<AttributeOut> {
    attributes.iter().map(attribute_out).collect()
}

/// Compact list representation: no description.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
}

pub fn recipe_summary(recipe: &Recipe) -> RecipeSummary {
    RecipeSummary {
        id: recipe.id,
        title: recipe.title.clone(),
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link.clone(),
        image: recipe.image.as_deref().map(media_path),
    }
}

/// Detail representation: adds the description and association lists.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<AttributeOut>,
    pub ingredients: Vec<AttributeOut>,
}

pub fn recipe_detail(recipe: &Recipe, tags: &[Attribute], ingredients: &[Attribute]) -> RecipeDetail {
    RecipeDetail {
        id: recipe.id,
        title: recipe.title.clone(),
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link.clone(),
        description: recipe.description.clone(),
        image: recipe.image.as_deref().map(media_path),
        tags: attributes_out(tags),
        ingredients: attributes_out(ingredients),
    }
}

fn media_path(relative: &str) -> String {
    format!("/media/{}", relative)
}
