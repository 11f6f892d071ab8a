//! Rendering of listing notifications for each channel.

use chrono::{DateTime, FixedOffset, Utc};
use listing_core::{Exchange, ListingEvent};
use serde_json::{json, Value};
use teloxide::utils::html;

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// `2024-01-15 14:00 KST`
pub fn format_kst(ts: &DateTime<Utc>) -> String {
    match FixedOffset::east_opt(KST_OFFSET_SECS) {
        Some(kst) => ts.with_timezone(&kst).format("%Y-%m-%d %H:%M KST").to_string(),
        None => ts.format("%Y-%m-%d %H:%M UTC").to_string(),
    }
}

fn exchange_emoji(exchange: Exchange) -> &'static str {
    match exchange {
        Exchange::Upbit => "🔵",
        Exchange::Bithumb => "🟡",
    }
}

/// Embed colour per exchange.
pub fn exchange_color(exchange: Exchange) -> u32 {
    match exchange {
        Exchange::Upbit => 0x1976D2,
        Exchange::Bithumb => 0xF57C00,
    }
}

/// Telegram message in HTML parse mode.
pub fn telegram_message(listing: &ListingEvent) -> String {
    let mut message = format!(
        "🚀 <b>새로운 상장 알림</b> {}\n\n",
        exchange_emoji(listing.exchange)
    );
    message.push_str(&format!(
        "💰 <b>{}</b> ({})\n",
        html::escape(&listing.display_name),
        html::escape(&listing.symbol)
    ));
    message.push_str(&format!("🏢 거래소: {}\n", listing.exchange.korean_name()));
    message.push_str(&format!("⏰ 상장일시: {}\n", format_kst(&listing.listed_at)));
    message.push_str(&format!(
        "🆔 마켓 ID: <code>{}</code>\n",
        html::escape(&listing.market_id)
    ));
    if !listing.source_url.is_empty() {
        message.push_str(&format!(
            "🔗 <a href=\"{}\">{}</a>\n",
            html::escape(&listing.source_url),
            if listing.is_from_announcement {
                "공지 보기"
            } else {
                "마켓 보기"
            }
        ));
    }
    message
}

/// Discord-compatible webhook payload.
pub fn webhook_payload(listing: &ListingEvent, footer: &str) -> Value {
    let exchange = listing.exchange.korean_name();
    let mut embed = json!({
        "title": format!("🚀 새로운 상장: {}", listing.display_name),
        "description": format!("{}이(가) {}에 상장되었습니다!", listing.symbol, exchange),
        "color": exchange_color(listing.exchange),
        "fields": [
            { "name": "거래소", "value": exchange, "inline": true },
            { "name": "심볼", "value": listing.symbol.as_str(), "inline": true },
            { "name": "마켓 ID", "value": listing.market_id, "inline": true },
            { "name": "상장일시", "value": format_kst(&listing.listed_at), "inline": false },
        ],
        "timestamp": listing.listed_at.to_rfc3339(),
        "footer": { "text": footer },
    });
    if !listing.source_url.is_empty() {
        embed["url"] = json!(listing.source_url);
    }
    json!({ "embeds": [embed] })
}

pub fn email_subject(listing: &ListingEvent) -> String {
    format!(
        "새로운 암호화폐 상장: {} ({})",
        listing.display_name, listing.symbol
    )
}

pub fn email_body(listing: &ListingEvent) -> String {
    let exchange = listing.exchange.korean_name();
    let mut body = format!("새로운 암호화폐가 {}에 상장되었습니다!\n\n", exchange);
    body.push_str(&format!("코인명: {}\n", listing.display_name));
    body.push_str(&format!("심볼: {}\n", listing.symbol));
    body.push_str(&format!("거래소: {}\n", exchange));
    body.push_str(&format!("상장일시: {}\n", format_kst(&listing.listed_at)));
    body.push_str(&format!("마켓 ID: {}\n", listing.market_id));
    if !listing.source_url.is_empty() {
        body.push_str(&format!("원문: {}\n", listing.source_url));
    }
    body.push_str("\n이 알림은 Crypto Listing Monitor에서 자동으로 발송되었습니다.\n");
    body
}
