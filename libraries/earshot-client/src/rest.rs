//! Table and procedure operations over the REST interface.
//!
//! Filters use the `column=op.value` query syntax of the backend's REST
//! layer; an empty match is an empty array, never an error.

use crate::error::{ClientError, Result};
use crate::response::{ensure_success, json};
use crate::types::{CreatePostArgs, ProfileUpdate, RelationPostId, RelationRow};
use chrono::Utc;
use earshot_core::{
    types::POSTS_TABLE,
    Category, NewPost, PostId, PostRow, Profile, Relation, UserId,
};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info};

/// Columns selected for every post read: the row, its author's username and
/// its category links.
pub const POST_SELECT: &str =
    "*,profiles:profiles!audio_posts_user_id_fkey(username),audio_post_categories(category_id)";

const CATEGORIES_TABLE: &str = "categories";
const PROFILES_TABLE: &str = "profiles";
const CREATE_POST_RPC: &str = "create_post_with_categories";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// REST client.
///
/// Requests carry the viewer's access token when signed in and the
/// anonymous key otherwise.
pub struct RestClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    anon_key: &'a str,
    access_token: Option<&'a str>,
}

impl<'a> RestClient<'a> {
    pub(crate) fn new(
        http: &'a Client,
        base_url: &'a str,
        anon_key: &'a str,
        access_token: Option<&'a str>,
    ) -> Self {
        Self {
            http,
            base_url,
            anon_key,
            access_token,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, path);
        self.http
            .request(method, url)
            .header("apikey", self.anon_key)
            .bearer_auth(self.access_token.unwrap_or(self.anon_key))
    }

    async fn send(builder: RequestBuilder) -> Result<reqwest::Response> {
        builder.send().await.map_err(ClientError::from_send)
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<PostRow>> {
        debug!("Listing posts");
        let response = Self::send(
            self.request(reqwest::Method::GET, POSTS_TABLE)
                .query(&[("select", POST_SELECT), ("order", "created_at.desc")]),
        )
        .await?;
        json(response, "posts").await
    }

    /// One post by id.
    pub async fn get_post(&self, id: &PostId) -> Result<Option<PostRow>> {
        debug!(post_id = %id, "Fetching post");
        let response = Self::send(
            self.request(reqwest::Method::GET, POSTS_TABLE)
                .query(&[("select", POST_SELECT.to_string()), ("id", eq(id))]),
        )
        .await?;
        let rows: Vec<PostRow> = json(response, "post").await?;
        Ok(rows.into_iter().next())
    }

    /// Ids of the posts `user` holds `relation` to.
    pub async fn relation_post_ids(&self, relation: Relation, user: &UserId) -> Result<Vec<PostId>> {
        let response = Self::send(
            self.request(reqwest::Method::GET, relation.table())
                .query(&[("select", "audio_post_id".to_string()), ("user_id", eq(user))]),
        )
        .await?;
        let rows: Vec<RelationPostId> = json(response, relation.table()).await?;
        Ok(rows.into_iter().map(|r| r.audio_post_id).collect())
    }

    /// Create a relation edge.
    pub async fn insert_relation(
        &self,
        relation: Relation,
        user: &UserId,
        post: &PostId,
    ) -> Result<()> {
        let row = RelationRow {
            user_id: user.clone(),
            audio_post_id: post.clone(),
        };
        let response = Self::send(
            self.request(reqwest::Method::POST, relation.table())
                .header("Prefer", "return=minimal")
                .json(&row),
        )
        .await?;
        ensure_success(response).await?;
        debug!(post_id = %post, ?relation, "Relation created");
        Ok(())
    }

    /// Delete a relation edge.
    pub async fn delete_relation(
        &self,
        relation: Relation,
        user: &UserId,
        post: &PostId,
    ) -> Result<()> {
        let response = Self::send(
            self.request(reqwest::Method::DELETE, relation.table())
                .query(&[("user_id", eq(user)), ("audio_post_id", eq(post))]),
        )
        .await?;
        ensure_success(response).await?;
        debug!(post_id = %post, ?relation, "Relation deleted");
        Ok(())
    }

    /// Delete a post row.
    pub async fn delete_post(&self, id: &PostId) -> Result<()> {
        let response = Self::send(
            self.request(reqwest::Method::DELETE, POSTS_TABLE)
                .query(&[("id", eq(id))]),
        )
        .await?;
        ensure_success(response).await?;
        info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Create a post and its category links in one transaction.
    pub async fn create_post_with_categories(&self, post: &NewPost) -> Result<()> {
        let args = CreatePostArgs {
            post_title: &post.title,
            post_duration: post.duration_seconds,
            post_audio_path: &post.audio_storage_path,
            category_ids: &post.category_ids,
        };
        let response = Self::send(
            self.request(reqwest::Method::POST, &format!("rpc/{CREATE_POST_RPC}"))
                .json(&args),
        )
        .await?;
        ensure_success(response).await?;
        info!(title = %post.title, "Post created");
        Ok(())
    }

    /// All categories.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let response = Self::send(
            self.request(reqwest::Method::GET, CATEGORIES_TABLE)
                .query(&[("select", "id,name,slug")]),
        )
        .await?;
        json(response, "categories").await
    }

    /// Profile of a user.
    pub async fn get_profile(&self, user: &UserId) -> Result<Option<Profile>> {
        let response = Self::send(
            self.request(reqwest::Method::GET, PROFILES_TABLE).query(&[
                ("select", "id,username,full_name,avatar_url,website".to_string()),
                ("id", eq(user)),
            ]),
        )
        .await?;
        let rows: Vec<Profile> = json(response, "profile").await?;
        Ok(rows.into_iter().next())
    }

    /// Insert or update a profile row.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let update = ProfileUpdate {
            id: &profile.id,
            username: &profile.username,
            full_name: profile.full_name.as_deref(),
            avatar_url: profile.avatar_url.as_deref(),
            website: profile.website.as_deref(),
            updated_at: Utc::now(),
        };
        let response = Self::send(
            self.request(reqwest::Method::POST, PROFILES_TABLE)
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&update),
        )
        .await?;
        ensure_success(response).await?;
        info!(user_id = %profile.id, "Profile updated");
        Ok(())
    }
}
