//! RSS 2.0 feed of the newest published listings.

use rss::{Category, Channel, Guid, Item};

use crate::models::{ListingType, Property};

/// How many listings the feed carries
pub const FEED_SIZE: i64 = 20;

fn listing_url(app_url: &str, property_id: i64) -> String {
    format!("{}/properties/{}", app_url, property_id)
}

/// One-line summary used as the item description
fn summary(property: &Property) -> String {
    let price = match property.listing_type {
        ListingType::Sale => property.price.to_string(),
        ListingType::Rent => format!("{} / month", property.price),
    };
    format!(
        "{} · {} · {} bd · {} ba · {} m²",
        price, property.location, property.bedrooms, property.bathrooms, property.surface
    )
}

fn listing_item(app_url: &str, property: &Property) -> Item {
    let url = listing_url(app_url, property.id);

    let mut guid = Guid::default();
    guid.set_value(url.clone());
    guid.set_permalink(true);

    let mut property_type = Category::default();
    property_type.set_name(property.property_type.as_str());
    let mut listing_type = Category::default();
    listing_type.set_name(property.listing_type.as_str());

    let mut item = Item::default();
    item.set_title(property.title.clone());
    item.set_link(url);
    item.set_description(summary(property));
    item.set_guid(guid);
    item.set_pub_date(property.created_at.to_rfc2822());
    item.set_categories(vec![property_type, listing_type]);
    item
}

/// Build the channel for `properties`, newest first as given
pub fn listings_channel(site_name: &str, app_url: &str, properties: &[Property]) -> Channel {
    let mut channel = Channel::default();
    channel.set_title(site_name);
    channel.set_link(format!("{}/properties", app_url));
    channel.set_description(format!("Latest listings on {}", site_name));
    if let Some(newest) = properties.first() {
        channel.set_last_build_date(newest.created_at.to_rfc2822());
    }
    channel.set_items(
        properties
            .iter()
            .map(|property| listing_item(app_url, property))
            .collect::<Vec<_>>(),
    );
    channel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use chrono::{TimeZone, Utc};
    use sqlx::types::Json;

    fn listing(id: i64, title: &str, listing_type: ListingType) -> Property {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        Property {
            id,
            user_id: 1,
            title: title.to_string(),
            description: "Quiet street".to_string(),
            price: 1200,
            location: "Porto".to_string(),
            property_type: PropertyType::Apartment,
            listing_type,
            bedrooms: 2,
            bathrooms: 1,
            surface: 70,
            images: Json(vec![]),
            is_published: true,
            is_featured: false,
            views: 0,
            contacts: 0,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_feed_round_trips_through_parser() {
        let properties = vec![
            listing(2, "Flat near the river", ListingType::Rent),
            listing(1, "Family house", ListingType::Sale),
        ];
        let xml = listings_channel("Casa Nova", "https://casa.example", &properties).to_string();

        let parsed = Channel::read_from(xml.as_bytes()).expect("valid RSS");
        assert_eq!(parsed.title(), "Casa Nova");
        assert_eq!(parsed.link(), "https://casa.example/properties");
        assert_eq!(parsed.items().len(), 2);

        let first = &parsed.items()[0];
        assert_eq!(first.title(), Some("Flat near the river"));
        assert_eq!(first.link(), Some("https://casa.example/properties/2"));
        assert!(first.description().unwrap().contains("1200 / month"));
        assert!(first.pub_date().unwrap().contains("15 Jan 2024"));
        let categories: Vec<_> = first.categories().iter().map(|c| c.name()).collect();
        assert_eq!(categories, vec!["apartment", "rent"]);
    }

    #[test]
    fn test_empty_feed() {
        let channel = listings_channel("Casa Nova", "https://casa.example", &[]);
        assert!(channel.items().is_empty());
        assert!(channel.last_build_date().is_none());
    }
}
