/// A request to swap one of the buyer's listings for someone else's. Never
/// stored; it only exists long enough to become an email.
#[derive(Debug, Clone)]
pub struct TradeOffer {
    pub lister_username: String,
    pub buyer_username: String,
    pub buyer_email: String,
    pub offered_item: String,
    pub wanted_item: String,
    pub listing_id: i64,
}

impl TradeOffer {
    pub fn subject(&self) -> String {
        format!("New trade offer for your item '{}'", self.wanted_item)
    }

    /// Plain-text body; `base_url` is where the listing page is served.
    pub fn body(&self, base_url: &str) -> String {
        format!(
            "Hello {lister},\n\
             The user {buyer} has offered a trade for one of your item listings!\n\
             \n\
             They wish to trade their '{offered}' for your '{wanted}'.\n\
             \n\
             Your item listing: {base}/item/{id}\n\
             \n\
             You can reach them at {email} in order to discuss this trade further.\n\
             \n\
             Have a great day,\n\
             ExchangeBay.",
            lister = self.lister_username,
            buyer = self.buyer_username,
            offered = self.offered_item,
            wanted = self.wanted_item,
            base = base_url.trim_end_matches('/'),
            id = self.listing_id,
            email = self.buyer_email,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer() -> TradeOffer {
        TradeOffer {
            lister_username: "doej".into(),
            buyer_username: "smithj".into(),
            buyer_email: "smithj@email.com".into(),
            offered_item: "Lamp".into(),
            wanted_item: "Bike".into(),
            listing_id: 3,
        }
    }

    #[test]
    fn subject_names_the_wanted_item() {
        assert_eq!(offer().subject(), "New trade offer for your item 'Bike'");
    }

    #[test]
    fn body_follows_the_template() {
        let expected = "Hello doej,\n\
                        The user smithj has offered a trade for one of your item listings!\n\
                        \n\
                        They wish to trade their 'Lamp' for your 'Bike'.\n\
                        \n\
                        Your item listing: http://localhost:8080/item/3\n\
                        \n\
                        You can reach them at smithj@email.com in order to discuss this trade further.\n\
                        \n\
                        Have a great day,\n\
                        ExchangeBay.";
        assert_eq!(offer().body("http://localhost:8080/"), expected);
    }
}
