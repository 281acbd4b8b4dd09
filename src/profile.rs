use crate::local_store::LocalStore;
use crate::models::{ProfileData, ProfileUpdate, User};
use crate::plants::date_key;
use chrono::NaiveDate;

pub const DEFAULT_GARDEN_SCORE: u32 = 100;
pub const DEFAULT_FAVORITE_PLANTS: [&str; 2] = ["Basil", "Tomato"];

/// Profile handed to a user seen for the first time.
pub fn seed_profile(user: &User, today: NaiveDate) -> ProfileData {
    let join_date = user
        .created_at
        .as_deref()
        .and_then(|created| created.get(..10))
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .unwrap_or(today);

    ProfileData {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        location: user.city.clone(),
        birth_date: user.birth_date.clone(),
        bio: String::new(),
        avatar: None,
        join_date: date_key(join_date),
        plants_owned: 0,
        plants_harvested: 0,
        garden_score: DEFAULT_GARDEN_SCORE,
        favorite_plants: DEFAULT_FAVORITE_PLANTS.iter().map(|p| p.to_string()).collect(),
    }
}

/// Overwrites the fields the remote user owns; local-only fields stay.
pub fn merge_user(profile: &ProfileData, user: &User) -> ProfileData {
    ProfileData {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        location: user.city.clone().or_else(|| profile.location.clone()),
        birth_date: user.birth_date.clone().or_else(|| profile.birth_date.clone()),
        ..profile.clone()
    }
}

pub fn apply_update(profile: &ProfileData, update: &ProfileUpdate) -> ProfileData {
    let mut next = profile.clone();
    if let Some(name) = update.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        next.name = name.to_string();
    }
    if let Some(bio) = &update.bio {
        next.bio = bio.trim().to_string();
    }
    if let Some(location) = &update.location {
        let location = location.trim();
        next.location = (!location.is_empty()).then(|| location.to_string());
    }
    if let Some(avatar) = &update.avatar {
        let avatar = avatar.trim();
        next.avatar = (!avatar.is_empty()).then(|| avatar.to_string());
    }
    if let Some(favorites) = &update.favorite_plants {
        next.favorite_plants = normalize_favorites(favorites);
    }
    next
}

fn normalize_favorites(favorites: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(favorites.len());
    for plant in favorites.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        if !out.iter().any(|existing| existing == plant) {
            out.push(plant.to_string());
        }
    }
    out
}

/// Creates the stored profile on first sight of `user`, merges it afterwards.
pub async fn sync_user_to_profile(
    storage: &LocalStore,
    user: &User,
    today: NaiveDate,
) -> std::io::Result<ProfileData> {
    let profile = match storage.load_profile().await {
        Some(existing) => merge_user(&existing, user),
        None => seed_profile(user, today),
    };
    storage.save_profile(&profile).await?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, city: Option<&str>) -> User {
        User {
            id: "u1".into(),
            name: name.into(),
            email: email.into(),
            city: city.map(Into::into),
            birth_date: Some("1990-04-01".into()),
            created_at: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn new_profile_gets_defaults() {
        let profile = seed_profile(&user("A", "a@b.com", None), today());
        assert_eq!(profile.favorite_plants, vec!["Basil", "Tomato"]);
        assert_eq!(profile.garden_score, 100);
        assert_eq!(profile.plants_owned, 0);
        assert_eq!(profile.plants_harvested, 0);
        assert_eq!(profile.bio, "");
        assert_eq!(profile.join_date, "2026-01-05");
    }

    #[test]
    fn join_date_follows_account_creation() {
        let mut remote = user("A", "a@b.com", None);
        remote.created_at = Some("2025-07-14T09:30:00Z".into());
        assert_eq!(seed_profile(&remote, today()).join_date, "2025-07-14");
    }

    #[test]
    fn merge_keeps_local_only_fields() {
        let mut profile = seed_profile(&user("Old", "old@b.com", Some("Bandung")), today());
        profile.bio = "Herbs on the balcony".into();
        profile.plants_owned = 7;
        profile.favorite_plants = vec!["Mint".into()];

        let merged = merge_user(&profile, &user("New", "new@b.com", Some("Jakarta")));
        assert_eq!(merged.name, "New");
        assert_eq!(merged.email, "new@b.com");
        assert_eq!(merged.location.as_deref(), Some("Jakarta"));
        assert_eq!(merged.bio, "Herbs on the balcony");
        assert_eq!(merged.plants_owned, 7);
        assert_eq!(merged.favorite_plants, vec!["Mint"]);
    }

    #[test]
    fn update_dedupes_favorites() {
        let profile = seed_profile(&user("A", "a@b.com", None), today());
        let update = ProfileUpdate {
            bio: Some(" grows chilies ".into()),
            favorite_plants: Some(vec!["Chili".into(), " ".into(), "Chili".into(), "Basil".into()]),
            ..ProfileUpdate::default()
        };
        let updated = apply_update(&profile, &update);
        assert_eq!(updated.bio, "grows chilies");
        assert_eq!(updated.favorite_plants, vec!["Chili", "Basil"]);
        assert_eq!(updated.name, "A");
    }

    #[tokio::test]
    async fn sync_creates_then_merges() {
        let storage = LocalStore::in_memory();
        let created = sync_user_to_profile(&storage, &user("A", "a@b.com", None), today())
            .await
            .unwrap();
        assert_eq!(created.garden_score, 100);

        let mut edited = created.clone();
        edited.bio = "local note".into();
        storage.save_profile(&edited).await.unwrap();

        let synced = sync_user_to_profile(&storage, &user("B", "b@b.com", None), today())
            .await
            .unwrap();
        assert_eq!(synced.name, "B");
        assert_eq!(synced.bio, "local note");
        assert_eq!(storage.load_profile().await, Some(synced));
    }
}
