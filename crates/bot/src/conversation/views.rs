//! Read-only catalog and account views.
//!
//! Builders turning backend DTOs into outgoing messages with button rows.
//! Pagination is driven by the backend's `next`/`previous` page links;
//! only the page number is carried in button payloads.

use chrono::{DateTime, Utc};

use tandir_core::Locale;

use super::texts;
use crate::api::types::{Branch, Cart, Category, Order, Page, Product, Profile};
use crate::transport::{InlineButton, OutgoingMessage, ReplyMarkup};

/// Locale selection keyboard (bilingual prompt - no locale chosen yet).
pub(crate) fn locale_keyboard() -> OutgoingMessage {
    OutgoingMessage::with_markup(
        texts::CHOOSE_LOCALE,
        ReplyMarkup::Inline(vec![vec![
            InlineButton::new("🇺🇿 O'zbekcha", "lang:uz"),
            InlineButton::new("🇷🇺 Русский", "lang:ru"),
        ]]),
    )
}

/// Registration prompt with the start-registration button.
pub(crate) fn auth_prompt(locale: Locale) -> OutgoingMessage {
    OutgoingMessage::with_markup(
        texts::auth_prompt(locale),
        ReplyMarkup::Inline(vec![vec![InlineButton::new(
            texts::register_button(locale),
            "auth:register",
        )]]),
    )
}

/// Share-contact vs. manual-entry choice.
pub(crate) fn phone_method_keyboard(locale: Locale) -> OutgoingMessage {
    OutgoingMessage::with_markup(
        texts::phone_method_prompt(locale),
        ReplyMarkup::Inline(vec![
            vec![InlineButton::new(
                texts::share_contact_button(locale),
                "phone:share",
            )],
            vec![InlineButton::new(
                texts::manual_phone_button(locale),
                "phone:manual",
            )],
            vec![InlineButton::new(texts::cancel_button(locale), "cancel")],
        ]),
    )
}

/// Contact-request reply keyboard.
pub(crate) fn contact_request(locale: Locale) -> OutgoingMessage {
    OutgoingMessage::with_markup(
        texts::share_contact_prompt(locale),
        ReplyMarkup::RequestContact(texts::share_contact_button(locale).to_owned()),
    )
}

/// The persistent main-menu keyboard.
pub(crate) fn main_menu(locale: Locale, title: &str) -> OutgoingMessage {
    OutgoingMessage::with_markup(
        title,
        ReplyMarkup::Persistent(vec![
            vec![
                texts::menu_label(locale).to_owned(),
                texts::cart_label(locale).to_owned(),
            ],
            vec![
                texts::orders_label(locale).to_owned(),
                texts::branches_label(locale).to_owned(),
            ],
            vec![
                texts::profile_label(locale).to_owned(),
                texts::LANGUAGE_LABEL.to_owned(),
            ],
        ]),
    )
}

/// Category list as buttons.
pub(crate) fn categories(locale: Locale, page: &Page<Category>) -> OutgoingMessage {
    if page.results.is_empty() {
        return OutgoingMessage::text(match locale {
            Locale::Uz => "Menyu hozircha bo'sh.",
            Locale::Ru => "Меню пока пусто.",
        });
    }

    let rows = page
        .results
        .iter()
        .map(|c| vec![InlineButton::new(c.name.clone(), format!("cat:{}", c.id))])
        .collect();

    let title = match locale {
        Locale::Uz => "Bo'limni tanlang:",
        Locale::Ru => "Выберите раздел:",
    };
    OutgoingMessage::with_markup(title, ReplyMarkup::Inline(rows))
}

/// One page of products in a category, with add buttons and pagination.
pub(crate) fn products(
    locale: Locale,
    category_id: tandir_core::CategoryId,
    page_number: u32,
    page: &Page<Product>,
) -> OutgoingMessage {
    if page.results.is_empty() {
        return OutgoingMessage::text(match locale {
            Locale::Uz => "Bu bo'limda mahsulotlar yo'q.",
            Locale::Ru => "В этом разделе нет товаров.",
        });
    }

    let mut rows: Vec<Vec<InlineButton>> = page
        .results
        .iter()
        .filter(|p| p.is_available)
        .map(|p| {
            let label = format!("{} - {}", p.name, texts::price(locale, p.price));
            vec![InlineButton::new(label, format!("prod:add:{}", p.id))]
        })
        .collect();

    let mut pagination = Vec::new();
    if page.previous.is_some() {
        pagination.push(InlineButton::new(
            "⬅️",
            format!("prod:page:{category_id}:{}", page_number - 1),
        ));
    }
    if page.next.is_some() {
        pagination.push(InlineButton::new(
            "➡️",
            format!("prod:page:{category_id}:{}", page_number + 1),
        ));
    }
    if !pagination.is_empty() {
        rows.push(pagination);
    }

    let title = match locale {
        Locale::Uz => "Mahsulotni tanlang:",
        Locale::Ru => "Выберите товар:",
    };
    OutgoingMessage::with_markup(title, ReplyMarkup::Inline(rows))
}

/// Cart contents with per-line quantity controls and the checkout button.
pub(crate) fn cart(locale: Locale, cart: &Cart) -> OutgoingMessage {
    if cart.items.is_empty() {
        return OutgoingMessage::text(texts::cart_empty(locale));
    }

    let mut text = String::from(match locale {
        Locale::Uz => "🛒 Savatingiz:\n\n",
        Locale::Ru => "🛒 Ваша корзина:\n\n",
    });
    let mut rows: Vec<Vec<InlineButton>> = Vec::new();

    for item in &cart.items {
        text.push_str(&format!(
            "• {} × {} = {}\n",
            item.product_name,
            item.quantity,
            texts::price(locale, item.line_total)
        ));
        // Target quantities are computed at render time so the button
        // payload is self-contained.
        let mut row = vec![InlineButton::new(
            "➕",
            format!("cart:set:{}:{}", item.id, item.quantity + 1),
        )];
        if item.quantity > 1 {
            row.push(InlineButton::new(
                "➖",
                format!("cart:set:{}:{}", item.id, item.quantity - 1),
            ));
        }
        row.push(InlineButton::new("🗑", format!("cart:del:{}", item.id)));
        rows.push(row);
    }

    text.push_str(&match locale {
        Locale::Uz => format!("\nJami: {}", texts::price(locale, cart.total_price)),
        Locale::Ru => format!("\nИтого: {}", texts::price(locale, cart.total_price)),
    });

    let checkout_label = match locale {
        Locale::Uz => "✅ Buyurtma berish",
        Locale::Ru => "✅ Оформить заказ",
    };
    rows.push(vec![InlineButton::new(checkout_label, "checkout:start")]);

    OutgoingMessage::with_markup(text, ReplyMarkup::Inline(rows))
}

/// One page of order history with per-order detail buttons.
pub(crate) fn history(locale: Locale, page_number: u32, page: &Page<Order>) -> OutgoingMessage {
    if page.count == 0 {
        return OutgoingMessage::text(match locale {
            Locale::Uz => "Sizda hali buyurtmalar mavjud emas.",
            Locale::Ru => "У вас пока нет заказов.",
        });
    }

    let mut text = String::from(match locale {
        Locale::Uz => "📋 Buyurtmalar tarixi:\n\n",
        Locale::Ru => "📋 История заказов:\n\n",
    });
    let mut rows: Vec<Vec<InlineButton>> = Vec::new();

    for order in &page.results {
        text.push_str(&format!(
            "#{} | {} | {} | {}\n",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            texts::status_label(locale, order.status),
            texts::price(locale, order.total_price)
        ));
        let detail_label = match locale {
            Locale::Uz => format!("Batafsil (#{})", order.id),
            Locale::Ru => format!("Подробнее (#{})", order.id),
        };
        rows.push(vec![InlineButton::new(
            detail_label,
            format!("order:{}", order.id),
        )]);
    }

    let mut pagination = Vec::new();
    if page.previous.is_some() {
        pagination.push(InlineButton::new(
            "⬅️",
            format!("hist:page:{}", page_number - 1),
        ));
    }
    if page.next.is_some() {
        pagination.push(InlineButton::new(
            "➡️",
            format!("hist:page:{}", page_number + 1),
        ));
    }
    if !pagination.is_empty() {
        rows.push(pagination);
    }

    OutgoingMessage::with_markup(text, ReplyMarkup::Inline(rows))
}

/// Detail view of one order, with a cancel button while still possible.
pub(crate) fn order_detail(locale: Locale, order: &Order) -> OutgoingMessage {
    let mut text = match locale {
        Locale::Uz => format!(
            "Buyurtma #{}\nHolati: {}\n",
            order.id,
            texts::status_label(locale, order.status)
        ),
        Locale::Ru => format!(
            "Заказ #{}\nСтатус: {}\n",
            order.id,
            texts::status_label(locale, order.status)
        ),
    };

    for item in &order.items {
        text.push_str(&format!(
            "• {} × {} = {}\n",
            item.product_name,
            item.quantity,
            texts::price(locale, item.line_total)
        ));
    }

    text.push_str(&match locale {
        Locale::Uz => format!("Jami: {}\n", texts::price(locale, order.total_price)),
        Locale::Ru => format!("Итого: {}\n", texts::price(locale, order.total_price)),
    });

    if let Some(ready_at) = order.estimated_ready_at {
        text.push_str(&match locale {
            Locale::Uz => format!("Tayyor bo'ladi: ~{}\n", format_time(ready_at)),
            Locale::Ru => format!("Будет готов: ~{}\n", format_time(ready_at)),
        });
    }
    if let Some(delivery_at) = order.estimated_delivery_at {
        text.push_str(&match locale {
            Locale::Uz => format!("Yetkaziladi: ~{}\n", format_time(delivery_at)),
            Locale::Ru => format!("Будет доставлен: ~{}\n", format_time(delivery_at)),
        });
    }

    if order.status.can_cancel() {
        let cancel_label = match locale {
            Locale::Uz => "❌ Buyurtmani bekor qilish",
            Locale::Ru => "❌ Отменить заказ",
        };
        return OutgoingMessage::with_markup(
            text,
            ReplyMarkup::Inline(vec![vec![InlineButton::new(
                cancel_label,
                format!("order:cancel:{}", order.id),
            )]]),
        );
    }

    OutgoingMessage::text(text)
}

/// Branch list with open/closed marks.
pub(crate) fn branches(locale: Locale, branches: &[Branch]) -> OutgoingMessage {
    if branches.is_empty() {
        return OutgoingMessage::text(match locale {
            Locale::Uz => "Filiallar topilmadi.",
            Locale::Ru => "Филиалы не найдены.",
        });
    }

    let mut text = String::from(match locale {
        Locale::Uz => "🏢 Filiallarimiz:\n\n",
        Locale::Ru => "🏢 Наши филиалы:\n\n",
    });
    for branch in branches {
        let mark = if branch.is_open { "🟢" } else { "🔴" };
        text.push_str(&format!("{mark} {} - {}\n", branch.name, branch.address));
    }

    OutgoingMessage::text(text)
}

/// Profile summary. Name and phone need no translation.
pub(crate) fn profile(_locale: Locale, profile: &Profile) -> OutgoingMessage {
    let name = profile.last_name.as_deref().map_or_else(
        || profile.first_name.clone(),
        |last| format!("{} {last}", profile.first_name),
    );

    OutgoingMessage::text(format!("👤 {name}\n📞 {}", profile.phone))
}

/// Delivery vs. pickup choice.
pub(crate) fn delivery_type_keyboard(locale: Locale) -> OutgoingMessage {
    OutgoingMessage::with_markup(
        texts::delivery_type_prompt(locale),
        ReplyMarkup::Inline(vec![
            vec![
                InlineButton::new(texts::delivery_button(locale), "checkout:delivery"),
                InlineButton::new(texts::pickup_button(locale), "checkout:pickup"),
            ],
            vec![InlineButton::new(texts::cancel_button(locale), "cancel")],
        ]),
    )
}

/// Open branches as buttons; cancel is always offered.
pub(crate) fn branch_keyboard(locale: Locale, open_branches: &[Branch]) -> OutgoingMessage {
    let mut rows: Vec<Vec<InlineButton>> = open_branches
        .iter()
        .map(|b| vec![InlineButton::new(b.name.clone(), format!("branch:{}", b.id))])
        .collect();
    rows.push(vec![InlineButton::new(texts::cancel_button(locale), "cancel")]);

    let title = if open_branches.is_empty() {
        texts::no_open_branches(locale)
    } else {
        texts::choose_branch_prompt(locale)
    };
    OutgoingMessage::with_markup(title, ReplyMarkup::Inline(rows))
}

/// Location-request reply keyboard.
pub(crate) fn location_request(locale: Locale) -> OutgoingMessage {
    OutgoingMessage::with_markup(
        texts::share_location_prompt(locale),
        ReplyMarkup::RequestLocation(texts::share_location_button(locale).to_owned()),
    )
}

/// Payment type choice.
pub(crate) fn payment_keyboard(locale: Locale) -> OutgoingMessage {
    OutgoingMessage::with_markup(
        texts::payment_prompt(locale),
        ReplyMarkup::Inline(vec![
            vec![
                InlineButton::new(texts::cash_button(locale), "pay:cash"),
                InlineButton::new(texts::card_button(locale), "pay:card"),
            ],
            vec![InlineButton::new(texts::cancel_button(locale), "cancel")],
        ]),
    )
}

/// Post-checkout confirmation naming the order and its estimates.
pub(crate) fn order_confirmation(locale: Locale, order: &Order) -> String {
    let mut text = match locale {
        Locale::Uz => format!(
            "✅ Buyurtmangiz #{} muvaffaqiyatli rasmiylashtirildi!\nJami: {}\n",
            order.id,
            texts::price(locale, order.total_price)
        ),
        Locale::Ru => format!(
            "✅ Ваш заказ #{} успешно оформлен!\nИтого: {}\n",
            order.id,
            texts::price(locale, order.total_price)
        ),
    };

    if let Some(ready_at) = order.estimated_ready_at {
        text.push_str(&match locale {
            Locale::Uz => format!("Tayyor bo'ladi: ~{}\n", format_time(ready_at)),
            Locale::Ru => format!("Будет готов: ~{}\n", format_time(ready_at)),
        });
    }
    if let Some(delivery_at) = order.estimated_delivery_at {
        text.push_str(&match locale {
            Locale::Uz => format!("Yetkaziladi: ~{}\n", format_time(delivery_at)),
            Locale::Ru => format!("Будет доставлен: ~{}\n", format_time(delivery_at)),
        });
    }

    text
}

/// Time-of-day for fulfillment estimates, which are always near-term.
fn format_time(at: DateTime<Utc>) -> String {
    at.format("%H:%M").to_string()
}
