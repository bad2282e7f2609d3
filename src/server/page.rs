//! Page responses consumed by the front end's page components.

use axum::Json;
use serde::Serialize;

use super::extract::{Auth, MaybeAuth};
use crate::db::Database;
use crate::error::AppError;
use crate::i18n::Language;
use crate::models::PublicUser;

/// A page component name with its props plus the shared props every page gets
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub component: &'static str,
    pub props: T,
    pub flash: Option<String>,
    pub locale: &'static str,
    pub auth: Option<PublicUser>,
}

impl<T: Serialize> Page<T> {
    /// Render for a signed-in user, consuming any pending flash message
    pub async fn for_user(
        db: &Database,
        auth: &Auth,
        component: &'static str,
        props: T,
    ) -> Result<Json<Self>, AppError> {
        let flash = db.take_flash(auth.session.id).await?;
        Ok(Json(Self {
            component,
            props,
            flash,
            locale: auth.language.code(),
            auth: Some(PublicUser::from(auth.user.clone())),
        }))
    }

    pub fn for_guest(language: Language, component: &'static str, props: T) -> Json<Self> {
        Json(Self {
            component,
            props,
            flash: None,
            locale: language.code(),
            auth: None,
        })
    }

    pub async fn render(
        db: &Database,
        viewer: &MaybeAuth,
        component: &'static str,
        props: T,
    ) -> Result<Json<Self>, AppError> {
        match &viewer.auth {
            Some(auth) => Self::for_user(db, auth, component, props).await,
            None => Ok(Self::for_guest(viewer.language, component, props)),
        }
    }
}

/// Store a one-time message for the next page the session renders
pub async fn flash(db: &Database, auth: &Auth, message: &str) -> Result<(), AppError> {
    db.set_flash(auth.session.id, message).await?;
    Ok(())
}
