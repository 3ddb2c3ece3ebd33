//! Navigation shell and the placeholder panels behind sign-in.
//!
//! The shell (header, drawer, footer) is described by a [`ShellView`] built
//! from the request by pure functions; the template only renders it. The
//! drawer state travels in the URL (`?drawer=open`), so toggling it is a
//! plain link.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::Query, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use colibri_core::UserProfile;

use crate::filters;
use crate::middleware::{RequireProfile, take_notice};
use crate::models::Notice;

/// Content panels reachable from the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Home,
    Upload,
    Tickets,
    Alistamiento,
    Serializacion,
    Facturas,
}

impl Panel {
    /// Panels in drawer order.
    pub const ALL: [Self; 6] = [
        Self::Home,
        Self::Upload,
        Self::Tickets,
        Self::Alistamiento,
        Self::Serializacion,
        Self::Facturas,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/home",
            Self::Upload => "/upload",
            Self::Tickets => "/tickets",
            Self::Alistamiento => "/alistamiento",
            Self::Serializacion => "/serializacion",
            Self::Facturas => "/facturas",
        }
    }

    /// Drawer entry label.
    #[must_use]
    pub const fn menu_label(self) -> &'static str {
        match self {
            Self::Home => "Resumen",
            Self::Upload => "Cargar Órdenes",
            Self::Tickets => "Tickets",
            Self::Alistamiento => "Alistamiento",
            Self::Serializacion => "Serialización",
            Self::Facturas => "Facturas",
        }
    }

    /// Info notice shown when the panel is opened from the drawer.
    #[must_use]
    pub const fn loading_notice(self) -> &'static str {
        match self {
            Self::Home => "🔄 Cargando resumen...",
            Self::Upload => "🔄 Cargando módulo de carga...",
            Self::Tickets => "🔄 Cargando tickets...",
            Self::Alistamiento => "🔄 Cargando alistamiento...",
            Self::Serializacion => "🔄 Cargando serialización...",
            Self::Facturas => "🔄 Cargando facturación...",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Panel principal",
            Self::Upload => "Carga y vista previa de órdenes",
            Self::Tickets => "Gestión de Tickets",
            Self::Alistamiento => "Panel de Alistamiento",
            Self::Serializacion => "Panel de Serialización",
            Self::Facturas => "Gestión de Facturas",
        }
    }

    /// Metric card titles (summary panel only).
    #[must_use]
    pub const fn metric_cards(self) -> &'static [&'static str] {
        match self {
            Self::Home => &[
                "Órdenes totales",
                "Tickets Pendientes",
                "Alistamiento en Proceso",
                "Serialización Pendiente",
                "Facturas Pendientes",
            ],
            _ => &[],
        }
    }

    /// Body text of panels that have one.
    #[must_use]
    pub const fn placeholder(self) -> Option<&'static str> {
        match self {
            Self::Upload => Some("Aquí irá el flujo de carga y vista previa."),
            _ => None,
        }
    }
}

/// Whether the drawer is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawerState {
    #[default]
    Closed,
    Open,
}

impl DrawerState {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Closed => Self::Open,
            Self::Open => Self::Closed,
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// A drawer entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// Everything the shell template needs to render a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView {
    pub drawer: DrawerState,
    pub user_label: String,
    pub menu: Vec<MenuItem>,
    pub panel: Panel,
}

impl ShellView {
    #[must_use]
    pub fn build(panel: Panel, profile: Option<&UserProfile>, drawer: DrawerState) -> Self {
        let menu = Panel::ALL
            .into_iter()
            .map(|entry| MenuItem {
                label: entry.menu_label(),
                // Navigating closes the drawer
                href: format!("{}?via=menu", entry.path()),
                active: entry == panel,
            })
            .collect();

        Self {
            drawer,
            user_label: user_label(profile),
            menu,
            panel,
        }
    }

    /// Link that renders the same panel with the drawer toggled.
    #[must_use]
    pub fn toggle_href(&self) -> String {
        match self.drawer.toggled() {
            DrawerState::Open => format!("{}?drawer=open", self.panel.path()),
            DrawerState::Closed => self.panel.path().to_owned(),
        }
    }
}

/// Header label for the signed-in user.
#[must_use]
pub fn user_label(profile: Option<&UserProfile>) -> String {
    match profile {
        Some(profile) if !profile.display_name.is_empty() => {
            format!("👤 {}", profile.display_name)
        }
        _ => "👤 Invitado".to_owned(),
    }
}

/// Query parameters understood by every panel.
#[derive(Debug, Default, Deserialize)]
pub struct PanelQuery {
    pub via: Option<String>,
    pub drawer: Option<String>,
}

impl PanelQuery {
    fn from_menu(&self) -> bool {
        self.via.as_deref() == Some("menu")
    }

    fn drawer(&self) -> DrawerState {
        if self.drawer.as_deref() == Some("open") {
            DrawerState::Open
        } else {
            DrawerState::Closed
        }
    }
}

/// Shell page template.
#[derive(Template, WebTemplate)]
#[template(path = "shell/panel.html")]
pub struct PanelTemplate {
    pub notice: Option<Notice>,
    pub shell: ShellView,
}

async fn render_panel(
    panel: Panel,
    profile: &UserProfile,
    session: &Session,
    query: &PanelQuery,
) -> PanelTemplate {
    // The pending notice is consumed either way; navigation replaces it
    let pending = take_notice(session).await;
    let notice = if query.from_menu() {
        info!(panel = panel.path(), "navigation from drawer");
        Some(Notice::info(panel.loading_notice()))
    } else {
        pending
    };

    PanelTemplate {
        notice,
        shell: ShellView::build(panel, Some(profile), query.drawer()),
    }
}

/// Summary panel with the metric cards.
pub async fn home(
    RequireProfile(profile): RequireProfile,
    session: Session,
    Query(query): Query<PanelQuery>,
) -> impl IntoResponse {
    render_panel(Panel::Home, &profile, &session, &query).await
}

/// Order upload panel.
pub async fn upload(
    RequireProfile(profile): RequireProfile,
    session: Session,
    Query(query): Query<PanelQuery>,
) -> impl IntoResponse {
    render_panel(Panel::Upload, &profile, &session, &query).await
}

/// Tickets panel.
pub async fn tickets(
    RequireProfile(profile): RequireProfile,
    session: Session,
    Query(query): Query<PanelQuery>,
) -> impl IntoResponse {
    render_panel(Panel::Tickets, &profile, &session, &query).await
}

/// Staging panel.
pub async fn alistamiento(
    RequireProfile(profile): RequireProfile,
    session: Session,
    Query(query): Query<PanelQuery>,
) -> impl IntoResponse {
    render_panel(Panel::Alistamiento, &profile, &session, &query).await
}

/// Serialization panel.
pub async fn serializacion(
    RequireProfile(profile): RequireProfile,
    session: Session,
    Query(query): Query<PanelQuery>,
) -> impl IntoResponse {
    render_panel(Panel::Serializacion, &profile, &session, &query).await
}

/// Invoices panel.
pub async fn facturas(
    RequireProfile(profile): RequireProfile,
    session: Session,
    Query(query): Query<PanelQuery>,
) -> impl IntoResponse {
    render_panel(Panel::Facturas, &profile, &session, &query).await
}
