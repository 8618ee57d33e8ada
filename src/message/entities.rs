use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::coerce_text;
use crate::nostr::{encode_pubkey_ref, is_valid_hex_id, normalize_profile_ref, nostr_uri};

/// A named illustrative entity (one of the herd's goats)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub profile: Option<String>,
    pub pubkey: Option<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: None,
            pubkey: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.pubkey = Some(pubkey.into());
        self
    }

    /// Protocol-channel reference: profile token, else `nostr:npub…`, else the plain name.
    pub fn reference(&self) -> String {
        normalize_profile_ref(self.profile.as_deref())
            .or_else(|| {
                self.pubkey
                    .as_deref()
                    .and_then(encode_pubkey_ref)
                    .map(|npub| nostr_uri(&npub))
            })
            .unwrap_or_else(|| self.name.clone())
    }

    /// Lowercased hex pubkey, when it is a valid 64-character id
    pub fn tag_pubkey(&self) -> Option<String> {
        self.pubkey
            .as_deref()
            .filter(|pk| is_valid_hex_id(pk))
            .map(|pk| pk.trim().to_lowercase())
    }
}

/// Display-channel entity: `{name, imageUrl}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityImage {
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

impl EntityImage {
    pub fn new(name: impl Into<String>, image_url: Option<String>) -> Self {
        let name = name.into();
        let image_url = image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| image_path(&name));
        Self { name, image_url }
    }
}

/// A random draw from the catalogue, already formatted for both channels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySelection {
    pub images: Vec<EntityImage>,
    /// Plain names joined for the display channel
    pub names: String,
    /// Protocol references joined for the protocol channel
    pub references: String,
    /// Hex pubkeys for p-tagging
    pub pubkeys: Vec<String>,
}

impl EntitySelection {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Fixed catalogue of illustrative entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCatalogue {
    entities: Vec<Entity>,
}

impl EntityCatalogue {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// The herd's goats
    pub fn goats() -> Self {
        Self::new(vec![
            Entity::new("Dexter")
                .with_profile("nostr:nprofile1qqsw4zlzyfx43mc88psnlse8sywpfl45kuap9dy05yzkepkvu6ca5wg7qyak5")
                .with_pubkey("ea8be2224d58ef0738613fc327811c14feb4b73a12b48fa1056c86cce6b1da39"),
            Entity::new("Rowan")
                .with_profile("nostr:nprofile1qqs2w94r0fs29gepzfn5zuaupn969gu3fstj3gq8kvw3cvx9fnxmaugwur22r")
                .with_pubkey("a716a37a60a2a32112674173bc0ccba2a3914c1728a007b31d1c30c54ccdbef1"),
            Entity::new("Nova")
                .with_profile("nostr:nprofile1qqsrzy7clymq5xwcfhh0dfz6zfe7h63k8r0j8yr49mxu6as4yv2084s0vf035")
                .with_pubkey("3113d8f9360a19d84deef6a45a1273ebea3638df2390752ecdcd76152314f3d6"),
            Entity::new("Cosmo")
                .with_profile("nostr:nprofile1qqsq6n8u7dzrnhhy7xy78k2ee7e4wxlgrkm5g2rgjl3napr9q54n4ncvkqcsj")
                .with_pubkey("0d4cfcf34439dee4f189e3d959cfb3571be81db744286897e33e8465052b3acf"),
            Entity::new("Newton")
                .with_profile("nostr:nprofile1qqszdsnpyzwhjcqads3hwfywt5jfmy85jvx8yup06yq0klrh93ldjxc26lmyx")
                .with_pubkey("26c261209d79601d6c2377248e5d249d90f4930c72702fd100fb7c772c7ed91b"),
        ])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Draw a random non-empty subset (1..=len entities).
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> EntitySelection {
        if self.is_empty() {
            return EntitySelection::default();
        }

        let count = rng.random_range(1..=self.len());
        let chosen: Vec<&Entity> = self.entities.choose_multiple(rng, count).collect();

        let names: Vec<String> = chosen.iter().map(|e| e.name.clone()).collect();
        let references: Vec<String> = chosen.iter().map(|e| e.reference()).collect();

        EntitySelection {
            images: chosen
                .iter()
                .map(|e| EntityImage::new(e.name.clone(), None))
                .collect(),
            names: join_with_and(&names),
            references: join_with_and(&references),
            pubkeys: chosen.iter().filter_map(|e| e.tag_pubkey()).collect(),
        }
    }
}

impl Default for EntityCatalogue {
    fn default() -> Self {
        Self::goats()
    }
}

/// "a", "a and b", "a, b and c"
pub fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Lowercase a name and drop everything but ASCII alphanumerics
pub fn image_slug(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn image_path(name: &str) -> String {
    format!("images/{}.png", image_slug(name))
}

const NAME_KEYS: &[&str] = &["name", "display_name", "member_name", "username"];
const IMAGE_KEYS: &[&str] = &["imageUrl", "image_url", "picture", "avatar"];

fn first_text(object: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn normalize_one(value: &Value) -> Option<EntityImage> {
    match value {
        Value::Object(object) => {
            let image = first_text(object, IMAGE_KEYS);
            let name = match first_text(object, NAME_KEYS) {
                Some(name) => name,
                None if image.is_some() => "Goat".to_string(),
                None => return None,
            };
            Some(EntityImage::new(name, image))
        }
        // [name, profile, pubkey, image?]
        Value::Array(parts) if !parts.is_empty() => {
            let name = parts
                .first()
                .and_then(coerce_text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Goat".to_string());
            let image = parts.get(3).and_then(Value::as_str).map(str::to_string);
            Some(EntityImage::new(name, image))
        }
        Value::String(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| EntityImage::new(name, None))
        }
        _ => None,
    }
}

/// Normalise caller-supplied entity data into `{name, imageUrl}` pairs.
///
/// Accepts a single entry or an array of entries; an entry is an object, a
/// `[name, profile, pubkey, image?]` array or a bare name. Returns `None` when nothing usable remains.
pub fn normalize_entities(raw: &Value) -> Option<Vec<EntityImage>> {
    let entries: Vec<EntityImage> = match raw {
        Value::Array(items) => items.iter().filter_map(normalize_one).collect(),
        other => normalize_one(other).into_iter().collect(),
    };

    (!entries.is_empty()).then_some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_join_with_and() {
        let items = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_with_and(&[]), "");
        assert_eq!(join_with_and(&items(&["Nova"])), "Nova");
        assert_eq!(join_with_and(&items(&["Nova", "Cosmo"])), "Nova and Cosmo");
        assert_eq!(
            join_with_and(&items(&["Nova", "Cosmo", "Dexter"])),
            "Nova, Cosmo and Dexter"
        );
    }

    #[test]
    fn test_image_slug() {
        assert_eq!(image_slug("Sir Newton-III"), "sirnewtoniii");
        assert_eq!(EntityImage::new("Nova", None).image_url, "images/nova.png");
    }

    #[test]
    fn test_selection_is_non_empty_subset() {
        let catalogue = EntityCatalogue::goats();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = catalogue.select(&mut rng);
            assert!(!selection.is_empty());
            assert!(selection.images.len() <= catalogue.len());
            assert_eq!(selection.pubkeys.len(), selection.images.len());

            let mut names: Vec<_> = selection.images.iter().map(|i| i.name.clone()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), selection.images.len());

            assert!(selection.references.contains("nostr:nprofile1"));
            assert!(!selection.references.contains("p-tag"));
        }
    }

    #[test]
    fn test_empty_catalogue_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(EntityCatalogue::new(vec![]).select(&mut rng).is_empty());
    }

    #[test]
    fn test_reference_falls_back_to_npub_then_name() {
        let npub_only = Entity::new("Pixel")
            .with_pubkey("3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d");
        assert!(npub_only.reference().starts_with("nostr:npub1"));
        assert_eq!(Entity::new("Pixel").reference(), "Pixel");
    }

    #[test]
    fn test_normalize_entity_shapes() {
        let entities = normalize_entities(&json!([
            {"display_name": "Nova", "picture": "https://img/nova.jpg"},
            {"imageUrl": "https://img/anon.png"},
            ["Cosmo", "nostr:nprofile1x", "abcd"],
            "Dexter",
            {"unrelated": true},
            42
        ]))
        .unwrap();

        assert_eq!(
            entities,
            vec![
                EntityImage::new("Nova", Some("https://img/nova.jpg".to_string())),
                EntityImage::new("Goat", Some("https://img/anon.png".to_string())),
                EntityImage::new("Cosmo", None),
                EntityImage::new("Dexter", None),
            ]
        );
        assert_eq!(entities[2].image_url, "images/cosmo.png");
    }

    #[test]
    fn test_normalize_single_and_empty() {
        assert_eq!(
            normalize_entities(&json!("Rowan")),
            Some(vec![EntityImage::new("Rowan", None)])
        );
        assert_eq!(normalize_entities(&json!([])), None);
        assert_eq!(normalize_entities(&json!(null)), None);
    }
}
