//! User-facing strings, Uzbek and Russian.
//!
//! Wording lives here and nowhere else; the machine and views pick
//! strings by the session locale. The locale prompt itself is bilingual
//! because it is shown before a choice exists.

use tandir_core::{Locale, Money, OrderStatus};

pub(crate) const CHOOSE_LOCALE: &str =
    "Iltimos, muloqot tilini tanlang / Пожалуйста, выберите язык общения:";

pub(crate) fn locale_chosen(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Til tanlandi!",
        Locale::Ru => "Язык выбран!",
    }
}

pub(crate) fn auth_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Davom etish uchun tizimga kirishingiz yoki ro'yxatdan o'tishingiz kerak.",
        Locale::Ru => "Для продолжения необходимо войти или зарегистрироваться.",
    }
}

pub(crate) fn register_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "📝 Ro'yxatdan o'tish / Kirish",
        Locale::Ru => "📝 Регистрация / Вход",
    }
}

pub(crate) fn phone_method_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Telefon raqamingizni qanday kiritmoqchisiz?",
        Locale::Ru => "Как вы хотите ввести свой номер телефона?",
    }
}

pub(crate) fn share_contact_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "📱 Kontaktni ulashish",
        Locale::Ru => "📱 Поделиться контактом",
    }
}

pub(crate) fn manual_phone_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "✍️ Raqamni qo'lda kiritish",
        Locale::Ru => "✍️ Ввести номер вручную",
    }
}

pub(crate) fn cancel_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "❌ Bekor qilish",
        Locale::Ru => "❌ Отмена",
    }
}

pub(crate) fn share_contact_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Iltimos, quyidagi tugma orqali telefon raqamingizni yuboring:",
        Locale::Ru => "Пожалуйста, отправьте свой номер телефона с помощью кнопки ниже:",
    }
}

pub(crate) fn manual_phone_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => {
            "Iltimos, telefon raqamingizni xalqaro formatda kiriting (masalan, +998901234567):"
        }
        Locale::Ru => {
            "Пожалуйста, введите свой номер телефона в международном формате (например, +998901234567):"
        }
    }
}

pub(crate) fn invalid_phone(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Telefon raqami noto'g'ri formatda. Qaytadan kiriting:",
        Locale::Ru => "Неверный формат номера телефона. Введите ещё раз:",
    }
}

pub(crate) fn otp_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Sizga yuborilgan tasdiqlash kodini kiriting:",
        Locale::Ru => "Введите отправленный вам код подтверждения:",
    }
}

pub(crate) fn invalid_otp(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Kod 4-6 ta raqamdan iborat bo'lishi kerak. Qaytadan kiriting:",
        Locale::Ru => "Код должен состоять из 4-6 цифр. Введите ещё раз:",
    }
}

pub(crate) fn welcome(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Xush kelibsiz! Asosiy menyu.",
        Locale::Ru => "Добро пожаловать! Главное меню.",
    }
}

pub(crate) fn main_menu_title(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Asosiy menyu.",
        Locale::Ru => "Главное меню.",
    }
}

pub(crate) fn clarification(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Tushunmadim. Iltimos, tugmalardan foydalaning yoki /start bosing.",
        Locale::Ru => "Не понял. Пожалуйста, используйте кнопки или нажмите /start.",
    }
}

pub(crate) fn cancelled(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Bekor qilindi. Qaytadan boshlash uchun /start bosing.",
        Locale::Ru => "Отменено. Нажмите /start, чтобы начать заново.",
    }
}

pub(crate) fn press_start(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Boshlash uchun /start bosing.",
        Locale::Ru => "Нажмите /start, чтобы начать.",
    }
}

pub(crate) fn session_expired(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Sessiya muddati tugadi. Iltimos, /start bosing.",
        Locale::Ru => "Сессия истекла. Пожалуйста, нажмите /start.",
    }
}

pub(crate) fn try_again_later(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Vaqtinchalik xatolik. Birozdan keyin qaytadan urinib ko'ring.",
        Locale::Ru => "Временная ошибка. Попробуйте ещё раз чуть позже.",
    }
}

pub(crate) fn registration_failed(locale: Locale, detail: &str) -> String {
    match locale {
        Locale::Uz => format!("Ro'yxatdan o'tib bo'lmadi: {detail}"),
        Locale::Ru => format!("Не удалось зарегистрироваться: {detail}"),
    }
}

pub(crate) fn wrong_code(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Kod noto'g'ri yoki muddati o'tgan. Qaytadan kiriting:",
        Locale::Ru => "Код неверный или просрочен. Введите ещё раз:",
    }
}

// ── Main menu labels (both locales are always accepted as input) ──────────

pub(crate) fn menu_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "🍴 Menyu",
        Locale::Ru => "🍴 Меню",
    }
}

pub(crate) fn cart_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "🛒 Savat",
        Locale::Ru => "🛒 Корзина",
    }
}

pub(crate) fn orders_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "📋 Buyurtmalarim",
        Locale::Ru => "📋 Мои заказы",
    }
}

pub(crate) fn branches_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "🏢 Filiallar",
        Locale::Ru => "🏢 Филиалы",
    }
}

pub(crate) fn profile_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "👤 Profil",
        Locale::Ru => "👤 Профиль",
    }
}

pub(crate) const LANGUAGE_LABEL: &str = "🌐 Til / Язык";

// ── Checkout ──────────────────────────────────────────────────────────────

pub(crate) fn cart_empty(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Savatingiz bo'sh.",
        Locale::Ru => "Ваша корзина пуста.",
    }
}

pub(crate) fn delivery_type_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Yetkazib berish turini tanlang:",
        Locale::Ru => "Выберите способ получения:",
    }
}

pub(crate) fn delivery_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "🚚 Yetkazib berish",
        Locale::Ru => "🚚 Доставка",
    }
}

pub(crate) fn pickup_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "🏃 Olib ketish",
        Locale::Ru => "🏃 Самовывоз",
    }
}

pub(crate) fn choose_branch_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Iltimos, olib ketish uchun ochiq filialni tanlang:",
        Locale::Ru => "Пожалуйста, выберите открытый филиал для самовывоза:",
    }
}

pub(crate) fn no_open_branches(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Afsuski, hozir ochiq filiallar mavjud emas. Buyurtmani bekor qilishingiz mumkin.",
        Locale::Ru => "К сожалению, сейчас нет открытых филиалов. Вы можете отменить заказ.",
    }
}

pub(crate) fn share_location_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "Yetkazib berish manzilini lokatsiya tugmasi orqali yuboring:",
        Locale::Ru => "Отправьте адрес доставки с помощью кнопки геолокации:",
    }
}

pub(crate) fn share_location_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "📍 Lokatsiya yuborish",
        Locale::Ru => "📍 Отправить локацию",
    }
}

pub(crate) fn payment_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "To'lov turini tanlang:",
        Locale::Ru => "Выберите способ оплаты:",
    }
}

pub(crate) fn cash_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "💵 Naqd",
        Locale::Ru => "💵 Наличные",
    }
}

pub(crate) fn card_button(locale: Locale) -> &'static str {
    match locale {
        Locale::Uz => "💳 Karta",
        Locale::Ru => "💳 Картой",
    }
}

pub(crate) fn error_detail(locale: Locale, detail: &str) -> String {
    match locale {
        Locale::Uz => format!("Xatolik: {detail}"),
        Locale::Ru => format!("Ошибка: {detail}"),
    }
}

pub(crate) fn checkout_failed(locale: Locale, detail: &str) -> String {
    match locale {
        Locale::Uz => format!("❌ Buyurtmani rasmiylashtirishda xatolik: {detail}"),
        Locale::Ru => format!("❌ Ошибка при оформлении заказа: {detail}"),
    }
}

pub(crate) fn price(locale: Locale, amount: Money) -> String {
    match locale {
        Locale::Uz => format!("{amount} so'm"),
        Locale::Ru => format!("{amount} сум"),
    }
}

pub(crate) fn status_label(locale: Locale, status: OrderStatus) -> &'static str {
    match (locale, status) {
        (Locale::Uz, OrderStatus::New) => "Yangi",
        (Locale::Uz, OrderStatus::Preparing) => "Tayyorlanmoqda",
        (Locale::Uz, OrderStatus::OnTheWay) => "Yo'lda",
        (Locale::Uz, OrderStatus::Delivered) => "Yetkazildi",
        (Locale::Uz, OrderStatus::Cancelled) => "Bekor qilindi",
        (Locale::Ru, OrderStatus::New) => "Новый",
        (Locale::Ru, OrderStatus::Preparing) => "Готовится",
        (Locale::Ru, OrderStatus::OnTheWay) => "В пути",
        (Locale::Ru, OrderStatus::Delivered) => "Доставлен",
        (Locale::Ru, OrderStatus::Cancelled) => "Отменён",
    }
}
