//! Main-menu dispatch and read-only browsing.
//!
//! Every branch here returns to `MainMenu` (the state simply never
//! changes) except the locale-change and checkout entries.

use tandir_core::{CartItemId, CategoryId, Locale, OrderId};

use super::{ChatEvent, Conversation, ConversationState, texts, views};
use crate::session::Session;
use crate::transport::OutgoingMessage;

/// Persistent-keyboard actions, recognized in either locale so a stale
/// keyboard keeps working after a language switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Menu,
    Cart,
    Orders,
    Branches,
    Profile,
    ChangeLanguage,
}

fn menu_action(text: &str) -> Option<MenuAction> {
    let text = text.trim();
    for locale in [Locale::Uz, Locale::Ru] {
        if text == texts::menu_label(locale) {
            return Some(MenuAction::Menu);
        }
        if text == texts::cart_label(locale) {
            return Some(MenuAction::Cart);
        }
        if text == texts::orders_label(locale) {
            return Some(MenuAction::Orders);
        }
        if text == texts::branches_label(locale) {
            return Some(MenuAction::Branches);
        }
        if text == texts::profile_label(locale) {
            return Some(MenuAction::Profile);
        }
    }
    (text == texts::LANGUAGE_LABEL).then_some(MenuAction::ChangeLanguage)
}

impl Conversation {
    /// `MainMenu`: persistent-keyboard commands and inline browsing
    /// buttons.
    pub(super) async fn on_main_menu(&self, session: &mut Session, event: ChatEvent) {
        match event {
            ChatEvent::Text { text, .. } => match menu_action(&text) {
                Some(MenuAction::Menu) => self.show_categories(session).await,
                Some(MenuAction::Cart) => self.show_cart(session).await,
                Some(MenuAction::Orders) => self.show_history(session, 1).await,
                Some(MenuAction::Branches) => self.show_branches(session).await,
                Some(MenuAction::Profile) => self.show_profile(session).await,
                Some(MenuAction::ChangeLanguage) => {
                    session.state = ConversationState::SelectingLocale;
                    self.send(session.identity, views::locale_keyboard()).await;
                }
                None => self.clarify(session).await,
            },
            ChatEvent::Button { payload } => self.on_menu_button(session, &payload).await,
            _ => self.clarify(session).await,
        }
    }

    /// Inline buttons reachable from the main menu.
    async fn on_menu_button(&self, session: &mut Session, payload: &str) {
        if let Some(id) = parse_id(payload, "cat:") {
            self.show_products(session, CategoryId::new(id), 1).await;
        } else if let Some(rest) = payload.strip_prefix("prod:page:") {
            let Some((category, page)) = parse_pair(rest) else {
                self.clarify(session).await;
                return;
            };
            self.show_products(session, CategoryId::new(category), page)
                .await;
        } else if let Some(id) = parse_id(payload, "prod:add:") {
            self.add_to_cart(session, tandir_core::ProductId::new(id))
                .await;
        } else if let Some(rest) = payload.strip_prefix("cart:set:") {
            let Some((item, quantity)) = parse_pair(rest) else {
                self.clarify(session).await;
                return;
            };
            self.set_cart_quantity(session, CartItemId::new(item), quantity)
                .await;
        } else if let Some(id) = parse_id(payload, "cart:del:") {
            self.remove_cart_item(session, CartItemId::new(id)).await;
        } else if payload == "checkout:start" {
            self.start_checkout(session).await;
        } else if let Some(page) = parse_id(payload, "hist:page:") {
            let page = u32::try_from(page.max(1)).unwrap_or(1);
            self.show_history(session, page).await;
        } else if let Some(id) = parse_id(payload, "order:cancel:") {
            self.cancel_order(session, OrderId::new(id)).await;
        } else if let Some(id) = parse_id(payload, "order:") {
            self.show_order(session, OrderId::new(id)).await;
        } else {
            self.clarify(session).await;
        }
    }

    async fn show_categories(&self, session: &mut Session) {
        match self.gateway.categories(session.identity).await {
            Ok(page) => {
                self.send(session.identity, views::categories(session.locale(), &page))
                    .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    async fn show_products(&self, session: &mut Session, category: CategoryId, page: u32) {
        match self
            .gateway
            .products(session.identity, Some(category), None, page)
            .await
        {
            Ok(result) => {
                self.send(
                    session.identity,
                    views::products(session.locale(), category, page, &result),
                )
                .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    async fn add_to_cart(&self, session: &mut Session, product: tandir_core::ProductId) {
        match self.gateway.add_to_cart(session.identity, product, 1).await {
            Ok(cart) => {
                self.send(session.identity, views::cart(session.locale(), &cart))
                    .await;
            }
            Err(e) => self.handle_stale_or_error(session, &e).await,
        }
    }

    async fn show_cart(&self, session: &mut Session) {
        match self.gateway.cart(session.identity).await {
            Ok(cart) => {
                self.send(session.identity, views::cart(session.locale(), &cart))
                    .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    async fn set_cart_quantity(&self, session: &mut Session, item: CartItemId, quantity: u32) {
        if quantity == 0 {
            self.remove_cart_item(session, item).await;
            return;
        }
        match self
            .gateway
            .set_cart_quantity(session.identity, item, quantity)
            .await
        {
            Ok(cart) => {
                self.send(session.identity, views::cart(session.locale(), &cart))
                    .await;
            }
            Err(e) => self.handle_stale_or_error(session, &e).await,
        }
    }

    async fn remove_cart_item(&self, session: &mut Session, item: CartItemId) {
        match self.gateway.remove_cart_item(session.identity, item).await {
            Ok(cart) => {
                self.send(session.identity, views::cart(session.locale(), &cart))
                    .await;
            }
            Err(e) => self.handle_stale_or_error(session, &e).await,
        }
    }

    async fn show_history(&self, session: &mut Session, page: u32) {
        match self.gateway.order_history(session.identity, page).await {
            Ok(result) => {
                self.send(session.identity, views::history(session.locale(), page, &result))
                    .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    async fn show_order(&self, session: &mut Session, order: OrderId) {
        match self.gateway.order_detail(session.identity, order).await {
            Ok(order) => {
                self.send(session.identity, views::order_detail(session.locale(), &order))
                    .await;
            }
            Err(e) => self.handle_stale_or_error(session, &e).await,
        }
    }

    async fn cancel_order(&self, session: &mut Session, order: OrderId) {
        match self.gateway.cancel_order(session.identity, order).await {
            Ok(order) => {
                self.send(session.identity, views::order_detail(session.locale(), &order))
                    .await;
            }
            Err(e) => self.handle_stale_or_error(session, &e).await,
        }
    }

    async fn show_branches(&self, session: &mut Session) {
        match self.gateway.branches(session.identity).await {
            Ok(branches) => {
                self.send(session.identity, views::branches(session.locale(), &branches))
                    .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    async fn show_profile(&self, session: &mut Session) {
        match self.gateway.profile(session.identity).await {
            Ok(profile) => {
                self.send(session.identity, views::profile(session.locale(), &profile))
                    .await;
            }
            Err(e) => self.surface_error(session, &e).await,
        }
    }

    /// A vanished entity means the view the button came from is stale:
    /// refresh the cart view instead of erroring.
    async fn handle_stale_or_error(&self, session: &mut Session, error: &crate::api::ApiError) {
        if matches!(error, crate::api::ApiError::NotFound { .. }) {
            self.send(
                session.identity,
                OutgoingMessage::text(texts::clarification(session.locale())),
            )
            .await;
            self.show_cart(session).await;
        } else {
            self.surface_error(session, error).await;
        }
    }
}

fn parse_id(payload: &str, prefix: &str) -> Option<i64> {
    payload.strip_prefix(prefix)?.parse().ok()
}

fn parse_pair(rest: &str) -> Option<(i64, u32)> {
    let (a, b) = rest.split_once(':')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_action_accepts_both_locales() {
        assert_eq!(menu_action("🍴 Menyu"), Some(MenuAction::Menu));
        assert_eq!(menu_action("🍴 Меню"), Some(MenuAction::Menu));
        assert_eq!(menu_action("🛒 Корзина"), Some(MenuAction::Cart));
        assert_eq!(menu_action("🌐 Til / Язык"), Some(MenuAction::ChangeLanguage));
        assert_eq!(menu_action("something else"), None);
    }

    #[test]
    fn test_payload_parsers() {
        assert_eq!(parse_id("cat:12", "cat:"), Some(12));
        assert_eq!(parse_id("cat:x", "cat:"), None);
        assert_eq!(parse_pair("3:2"), Some((3, 2)));
        assert_eq!(parse_pair("3"), None);
    }
}
