//! In-memory adapter implementing every repository port.
//!
//! Uniqueness rules and delete cascades mirror the SQL schema so service and
//! HTTP tests can run without a database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use yamdb_model::{
    Category, CategoryId, Comment, CommentChanges, CommentId, Genre, GenreId, NewComment,
    NewReview, NewUser, Page, PageRequest, Review, ReviewChanges, ReviewId, Taxon, Title,
    TitleFilter, TitleId, User, UserChanges, UserId,
};

use super::conflict_for;
use super::ports::comments::CommentsRepository;
use super::ports::dataset::{CommentRow, DatasetWriter, GenreLink, ReviewRow, TitleRow, UserRow};
use super::ports::reviews::ReviewsRepository;
use super::ports::taxonomy::{TaxonEntity, TaxonomyRepository};
use super::ports::titles::{TitleRecord, TitleRecordChanges, TitlesRepository};
use super::ports::users::UsersRepository;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone)]
struct TaxonSlot {
    name: String,
    slug: String,
}

#[derive(Debug, Clone)]
struct StoredTitle {
    name: String,
    year: i32,
    description: String,
    category_id: Option<CategoryId>,
    genre_ids: Vec<GenreId>,
}

#[derive(Debug, Clone)]
struct StoredReview {
    title_id: TitleId,
    author_id: UserId,
    text: String,
    score: i32,
    pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredComment {
    review_id: ReviewId,
    author_id: UserId,
    text: String,
    pub_date: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    taxa: HashMap<&'static str, BTreeMap<i64, TaxonSlot>>,
    titles: BTreeMap<TitleId, StoredTitle>,
    reviews: BTreeMap<ReviewId, StoredReview>,
    comments: BTreeMap<CommentId, StoredComment>,
    sequences: HashMap<&'static str, i64>,
}

impl State {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let slot = self.sequences.entry(table).or_insert(0);
        *slot += 1;
        *slot
    }

    fn bump_sequence(&mut self, table: &'static str, id: i64) {
        let slot = self.sequences.entry(table).or_insert(0);
        *slot = (*slot).max(id);
    }

    fn taxa(&self, table: &'static str) -> Option<&BTreeMap<i64, TaxonSlot>> {
        self.taxa.get(table)
    }

    fn taxa_mut(&mut self, table: &'static str) -> &mut BTreeMap<i64, TaxonSlot> {
        self.taxa.entry(table).or_default()
    }

    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|user| user.username == username && Some(user.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }

    fn check_user_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<UserId>,
    ) -> Result<()> {
        if let Some(username) = username
            && self.username_taken(username, except)
        {
            return Err(conflict("users_username_key"));
        }
        if let Some(email) = email
            && self.email_taken(email, except)
        {
            return Err(conflict("users_email_key"));
        }
        Ok(())
    }

    fn category(&self, id: CategoryId) -> Option<Category> {
        self.taxa(Category::TABLE)
            .and_then(|rows| rows.get(&id.get()))
            .map(|slot| Category::from_parts(id.get(), slot.name.clone(), slot.slug.clone()))
    }

    fn genre(&self, id: GenreId) -> Option<Genre> {
        self.taxa(Genre::TABLE)
            .and_then(|rows| rows.get(&id.get()))
            .map(|slot| Genre::from_parts(id.get(), slot.name.clone(), slot.slug.clone()))
    }

    fn rating(&self, title_id: TitleId) -> Option<f64> {
        let scores: Vec<i32> = self
            .reviews
            .values()
            .filter(|review| review.title_id == title_id)
            .map(|review| review.score)
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64)
        }
    }

    fn title(&self, id: TitleId) -> Option<Title> {
        let stored = self.titles.get(&id)?;
        let mut genres: Vec<Genre> = stored
            .genre_ids
            .iter()
            .filter_map(|genre_id| self.genre(*genre_id))
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Some(Title {
            id,
            name: stored.name.clone(),
            year: stored.year,
            description: stored.description.clone(),
            category: stored.category_id.and_then(|category_id| self.category(category_id)),
            genres,
            rating: self.rating(id),
        })
    }

    fn author_name(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }

    fn review(&self, id: ReviewId) -> Option<Review> {
        let stored = self.reviews.get(&id)?;
        Some(Review {
            id,
            title_id: stored.title_id,
            author_id: stored.author_id,
            author: self.author_name(stored.author_id),
            text: stored.text.clone(),
            score: stored.score,
            pub_date: stored.pub_date,
        })
    }

    fn comment(&self, id: CommentId) -> Option<Comment> {
        let stored = self.comments.get(&id)?;
        Some(Comment {
            id,
            review_id: stored.review_id,
            author_id: stored.author_id,
            author: self.author_name(stored.author_id),
            text: stored.text.clone(),
            pub_date: stored.pub_date,
        })
    }

    fn remove_reviews_where(&mut self, predicate: impl Fn(&StoredReview) -> bool) {
        let doomed: Vec<ReviewId> = self
            .reviews
            .iter()
            .filter(|(_, review)| predicate(review))
            .map(|(id, _)| *id)
            .collect();
        for id in doomed {
            self.reviews.remove(&id);
            self.comments.retain(|_, comment| comment.review_id != id);
        }
    }
}

fn conflict(constraint: &str) -> CoreError {
    conflict_for(constraint).unwrap_or_else(|| CoreError::Internal(constraint.to_string()))
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

/// Reads newest first, ties broken by the higher id.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: RwLock<State>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepository for MemoryDatabase {
    async fn list_users(&self, search: Option<&str>, page: PageRequest) -> Result<Page<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| contains_ci(&user.username, search))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(page.slice(&users))
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        state.check_user_unique(Some(&user.username), Some(&user.email), None)?;
        let id = UserId(state.next_id("users"));
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            role: user.role,
            is_superuser: user.is_superuser,
            last_login: None,
            date_joined: Utc::now(),
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: UserId, changes: &UserChanges) -> Result<Option<User>> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        state.check_user_unique(changes.username.as_deref(), changes.email.as_deref(), Some(id))?;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.remove_reviews_where(|review| review.author_id == id);
        state.comments.retain(|_, comment| comment.author_id != id);
        Ok(true)
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        if let Some(user) = self.state.write().await.users.get_mut(&id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl<T: TaxonEntity> TaxonomyRepository<T> for MemoryDatabase {
    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<T>> {
        let state = self.state.read().await;
        let mut rows: Vec<T> = state
            .taxa(T::TABLE)
            .map(|rows| {
                rows.iter()
                    .filter(|(_, slot)| contains_ci(&slot.name, search))
                    .map(|(id, slot)| T::from_parts(*id, slot.name.clone(), slot.slug.clone()))
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        Ok(page.slice(&rows))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<T>> {
        let state = self.state.read().await;
        Ok(state.taxa(T::TABLE).and_then(|rows| {
            rows.iter()
                .find(|(_, slot)| slot.slug == slug)
                .map(|(id, slot)| T::from_parts(*id, slot.name.clone(), slot.slug.clone()))
        }))
    }

    async fn create(&self, taxon: &Taxon) -> Result<T> {
        let mut state = self.state.write().await;
        let taken = state
            .taxa(T::TABLE)
            .is_some_and(|rows| rows.values().any(|slot| slot.slug == taxon.slug));
        if taken {
            return Err(conflict(&format!("{}_slug_key", T::TABLE)));
        }
        let id = state.next_id(T::TABLE);
        state.taxa_mut(T::TABLE).insert(
            id,
            TaxonSlot {
                name: taxon.name.clone(),
                slug: taxon.slug.clone(),
            },
        );
        Ok(T::from_parts(id, taxon.name.clone(), taxon.slug.clone()))
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(id) = state.taxa(T::TABLE).and_then(|rows| {
            rows.iter()
                .find(|(_, slot)| slot.slug == slug)
                .map(|(id, _)| *id)
        }) else {
            return Ok(false);
        };
        state.taxa_mut(T::TABLE).remove(&id);

        if T::TABLE == Category::TABLE {
            for title in state.titles.values_mut() {
                if title.category_id == Some(CategoryId(id)) {
                    title.category_id = None;
                }
            }
        } else if T::TABLE == Genre::TABLE {
            for title in state.titles.values_mut() {
                title.genre_ids.retain(|genre_id| *genre_id != GenreId(id));
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl TitlesRepository for MemoryDatabase {
    async fn list_titles(&self, filter: &TitleFilter, page: PageRequest) -> Result<Page<Title>> {
        let state = self.state.read().await;
        let mut titles: Vec<Title> = state
            .titles
            .keys()
            .filter_map(|id| state.title(*id))
            .filter(|title| filter.matches(title))
            .collect();
        titles.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then_with(|| a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        });
        Ok(page.slice(&titles))
    }

    async fn get_title(&self, id: TitleId) -> Result<Option<Title>> {
        Ok(self.state.read().await.title(id))
    }

    async fn create_title(&self, record: &TitleRecord) -> Result<Title> {
        let mut state = self.state.write().await;
        let id = TitleId(state.next_id("titles"));
        let mut genre_ids = record.genre_ids.clone();
        genre_ids.dedup();
        state.titles.insert(
            id,
            StoredTitle {
                name: record.name.clone(),
                year: record.year,
                description: record.description.clone(),
                category_id: Some(record.category_id),
                genre_ids,
            },
        );
        state.title(id).ok_or_else(CoreError::not_found)
    }

    async fn update_title(&self, id: TitleId, changes: &TitleRecordChanges) -> Result<Option<Title>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.titles.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            stored.name = name.clone();
        }
        if let Some(year) = changes.year {
            stored.year = year;
        }
        if let Some(description) = &changes.description {
            stored.description = description.clone();
        }
        if let Some(category_id) = changes.category_id {
            stored.category_id = Some(category_id);
        }
        if let Some(genre_ids) = &changes.genre_ids {
            stored.genre_ids = genre_ids.clone();
        }
        Ok(state.title(id))
    }

    async fn delete_title(&self, id: TitleId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.titles.remove(&id).is_none() {
            return Ok(false);
        }
        state.remove_reviews_where(|review| review.title_id == id);
        Ok(true)
    }
}

#[async_trait]
impl ReviewsRepository for MemoryDatabase {
    async fn list_reviews(&self, title_id: TitleId, page: PageRequest) -> Result<Page<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|(_, review)| review.title_id == title_id)
            .filter_map(|(id, _)| state.review(*id))
            .collect();
        newest_first(&mut reviews, |review| (review.pub_date, review.id.get()));
        Ok(page.slice(&reviews))
    }

    async fn get_review(&self, title_id: TitleId, review_id: ReviewId) -> Result<Option<Review>> {
        let state = self.state.read().await;
        Ok(state
            .review(review_id)
            .filter(|review| review.title_id == title_id))
    }

    async fn review_exists(&self, title_id: TitleId, author_id: UserId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .any(|review| review.title_id == title_id && review.author_id == author_id))
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review> {
        let mut state = self.state.write().await;
        let duplicate = state
            .reviews
            .values()
            .any(|r| r.title_id == review.title_id && r.author_id == review.author_id);
        if duplicate {
            return Err(conflict("unique_title_author"));
        }
        if !state.titles.contains_key(&review.title_id) || !state.users.contains_key(&review.author_id)
        {
            return Err(CoreError::not_found());
        }
        let id = ReviewId(state.next_id("reviews"));
        state.reviews.insert(
            id,
            StoredReview {
                title_id: review.title_id,
                author_id: review.author_id,
                text: review.text.clone(),
                score: review.score,
                pub_date: Utc::now(),
            },
        );
        state.review(id).ok_or_else(CoreError::not_found)
    }

    async fn update_review(&self, id: ReviewId, changes: &ReviewChanges) -> Result<Option<Review>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.reviews.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(text) = &changes.text {
            stored.text = text.clone();
        }
        if let Some(score) = changes.score {
            stored.score = score;
        }
        Ok(state.review(id))
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.reviews.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, comment| comment.review_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentsRepository for MemoryDatabase {
    async fn list_comments(&self, review_id: ReviewId, page: PageRequest) -> Result<Page<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|(_, comment)| comment.review_id == review_id)
            .filter_map(|(id, _)| state.comment(*id))
            .collect();
        newest_first(&mut comments, |comment| (comment.pub_date, comment.id.get()));
        Ok(page.slice(&comments))
    }

    async fn get_comment(&self, review_id: ReviewId, comment_id: CommentId) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comment(comment_id)
            .filter(|comment| comment.review_id == review_id))
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let mut state = self.state.write().await;
        if !state.reviews.contains_key(&comment.review_id) {
            return Err(CoreError::not_found());
        }
        let id = CommentId(state.next_id("comments"));
        state.comments.insert(
            id,
            StoredComment {
                review_id: comment.review_id,
                author_id: comment.author_id,
                text: comment.text.clone(),
                pub_date: Utc::now(),
            },
        );
        state.comment(id).ok_or_else(CoreError::not_found)
    }

    async fn update_comment(&self, id: CommentId, changes: &CommentChanges) -> Result<Option<Comment>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.comments.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(text) = &changes.text {
            stored.text = text.clone();
        }
        Ok(state.comment(id))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool> {
        Ok(self.state.write().await.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl DatasetWriter for MemoryDatabase {
    async fn upsert_categories(&self, rows: &[Category]) -> Result<u64> {
        let mut state = self.state.write().await;
        for row in rows {
            state.taxa_mut(Category::TABLE).insert(
                row.id.get(),
                TaxonSlot {
                    name: row.name.clone(),
                    slug: row.slug.clone(),
                },
            );
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_genres(&self, rows: &[Genre]) -> Result<u64> {
        let mut state = self.state.write().await;
        for row in rows {
            state.taxa_mut(Genre::TABLE).insert(
                row.id.get(),
                TaxonSlot {
                    name: row.name.clone(),
                    slug: row.slug.clone(),
                },
            );
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_users(&self, rows: &[UserRow]) -> Result<u64> {
        let mut state = self.state.write().await;
        for row in rows {
            state.check_user_unique(Some(&row.username), Some(&row.email), Some(row.id))?;
            let date_joined = state
                .users
                .get(&row.id)
                .map(|user| user.date_joined)
                .unwrap_or_else(Utc::now);
            state.users.insert(
                row.id,
                User {
                    id: row.id,
                    username: row.username.clone(),
                    email: row.email.clone(),
                    first_name: row.first_name.clone(),
                    last_name: row.last_name.clone(),
                    bio: row.bio.clone(),
                    role: row.role,
                    is_superuser: false,
                    last_login: None,
                    date_joined,
                },
            );
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_titles(&self, rows: &[TitleRow]) -> Result<u64> {
        let mut state = self.state.write().await;
        for row in rows {
            let genre_ids = state
                .titles
                .get(&row.id)
                .map(|title| title.genre_ids.clone())
                .unwrap_or_default();
            state.titles.insert(
                row.id,
                StoredTitle {
                    name: row.name.clone(),
                    year: row.year,
                    description: String::new(),
                    category_id: row.category_id,
                    genre_ids,
                },
            );
        }
        Ok(rows.len() as u64)
    }

    async fn link_genres(&self, rows: &[GenreLink]) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut inserted = 0;
        for row in rows {
            if let Some(title) = state.titles.get_mut(&row.title_id)
                && !title.genre_ids.contains(&row.genre_id)
            {
                title.genre_ids.push(row.genre_id);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn upsert_reviews(&self, rows: &[ReviewRow]) -> Result<u64> {
        let mut state = self.state.write().await;
        for row in rows {
            let duplicate = state.reviews.iter().any(|(id, review)| {
                *id != row.id && review.title_id == row.title_id && review.author_id == row.author_id
            });
            if duplicate {
                return Err(conflict("unique_title_author"));
            }
            state.reviews.insert(
                row.id,
                StoredReview {
                    title_id: row.title_id,
                    author_id: row.author_id,
                    text: row.text.clone(),
                    score: row.score,
                    pub_date: row.pub_date,
                },
            );
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_comments(&self, rows: &[CommentRow]) -> Result<u64> {
        let mut state = self.state.write().await;
        for row in rows {
            state.comments.insert(
                row.id,
                StoredComment {
                    review_id: row.review_id,
                    author_id: row.author_id,
                    text: row.text.clone(),
                    pub_date: row.pub_date,
                },
            );
        }
        Ok(rows.len() as u64)
    }

    async fn realign_sequences(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let highest = [
            ("users", state.users.keys().last().map(|id| id.get())),
            ("categories", state.taxa(Category::TABLE).and_then(|r| r.keys().last().copied())),
            ("genres", state.taxa(Genre::TABLE).and_then(|r| r.keys().last().copied())),
            ("titles", state.titles.keys().last().map(|id| id.get())),
            ("reviews", state.reviews.keys().last().map(|id| id.get())),
            ("comments", state.comments.keys().last().map(|id| id.get())),
        ];
        for (table, max) in highest {
            if let Some(max) = max {
                state.bump_sequence(table, max);
            }
        }
        Ok(())
    }
}

/// Users port whose every call fails, for exercising storage outages.
#[derive(Debug, Default)]
pub struct UnavailableUsers;

impl UnavailableUsers {
    fn outage<T>() -> Result<T> {
        Err(CoreError::Internal("users store unavailable".to_string()))
    }
}

#[async_trait]
impl UsersRepository for UnavailableUsers {
    async fn list_users(&self, _search: Option<&str>, _page: PageRequest) -> Result<Page<User>> {
        Self::outage()
    }

    async fn get_user_by_id(&self, _id: UserId) -> Result<Option<User>> {
        Self::outage()
    }

    async fn get_user_by_username(&self, _username: &str) -> Result<Option<User>> {
        Self::outage()
    }

    async fn get_user_by_email(&self, _email: &str) -> Result<Option<User>> {
        Self::outage()
    }

    async fn create_user(&self, _user: &NewUser) -> Result<User> {
        Self::outage()
    }

    async fn update_user(&self, _id: UserId, _changes: &UserChanges) -> Result<Option<User>> {
        Self::outage()
    }

    async fn delete_user(&self, _id: UserId) -> Result<bool> {
        Self::outage()
    }

    async fn record_login(&self, _id: UserId, _at: DateTime<Utc>) -> Result<()> {
        Self::outage()
    }
}
