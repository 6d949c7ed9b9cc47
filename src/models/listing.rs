use crate::models::user::User;
use serde::{Deserialize, Serialize};

/// Public listing of finished users.
///
/// Three comma-joined strings aligned by index rather than a list of objects.
/// A username containing a comma breaks the alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub usernames: String,
    pub ids: String,
    pub colors: String,
}

impl Listing {
    /// Build the listing in the order given
    pub fn from_users(users: &[User]) -> Self {
        let mut listing = Listing::default();
        let mut id_buf = itoa::Buffer::new();

        for (i, user) in users.iter().enumerate() {
            if i > 0 {
                listing.usernames.push(',');
                listing.ids.push(',');
                listing.colors.push(',');
            }
            listing.usernames.push_str(&user.username);
            listing.ids.push_str(id_buf.format(user.id));
            listing.colors.push_str(&user.color);
        }

        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(id: i64, name: &str, color: &str) -> User {
        let mut user = User::anonymous(format!("10.0.0.{}", id), id);
        user.id = id;
        user.username = name.to_string();
        user.color = color.to_string();
        user
    }

    #[test]
    fn test_empty_listing() {
        let listing = Listing::from_users(&[]);
        assert_eq!(listing, Listing::default());

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json, serde_json::json!({"usernames": "", "ids": "", "colors": ""}));
    }

    #[test]
    fn test_listing_is_index_aligned() {
        let users = vec![
            finished(3, "carol", "#abcdef"),
            finished(1, "alice", "#000000"),
        ];

        let listing = Listing::from_users(&users);

        assert_eq!(listing.usernames, "carol,alice");
        assert_eq!(listing.ids, "3,1");
        assert_eq!(listing.colors, "#abcdef,#000000");
    }

    #[test]
    fn test_comma_in_username_breaks_alignment() {
        let users = vec![finished(1, "a,b", "#111111"), finished(2, "c", "#222222")];
        let listing = Listing::from_users(&users);

        assert_eq!(listing.usernames.split(',').count(), 3);
        assert_eq!(listing.ids.split(',').count(), 2);
    }
}
