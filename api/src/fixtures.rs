//! Deterministic placeholder data: 10 users, each owning 10 posts, 10 albums
//! and 20 todos.

use payloads::responses::{Album, Post, Todo, User};
use serde::Deserialize;

const USERS: &[(&str, &str)] = &[
    ("Leanne Graham", "Bret"),
    ("Ervin Howell", "Antonette"),
    ("Clementine Bauch", "Samantha"),
    ("Patricia Lebsack", "Karianne"),
    ("Chelsey Dietrich", "Kamren"),
    ("Dennis Schulist", "Leopoldo_Corkery"),
    ("Kurtis Weissnat", "Elwyn.Skiles"),
    ("Nicholas Runolfsdottir", "Maxime_Nienow"),
    ("Glenna Reichert", "Delphine"),
    ("Clementina DuBuque", "Moriah.Stanton"),
];

const POSTS_PER_USER: u32 = 10;
const ALBUMS_PER_USER: u32 = 10;
const TODOS_PER_USER: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Users,
    Posts,
    Albums,
    Todos,
}

pub struct Fixtures {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub albums: Vec<Album>,
    pub todos: Vec<Todo>,
}

impl Fixtures {
    pub fn generate() -> Self {
        let users = USERS
            .iter()
            .zip(1..)
            .map(|(&(name, username), id)| User {
                id,
                name: name.to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username.to_lowercase()),
                website: format!("{}.example.org", username.to_lowercase()),
            })
            .collect::<Vec<_>>();

        let owned = |per_user: u32| {
            users.iter().flat_map(move |user| {
                (1..=per_user)
                    .map(move |n| (user.id, (user.id - 1) * per_user + n))
            })
        };

        let posts = owned(POSTS_PER_USER)
            .map(|(user_id, id)| Post {
                user_id,
                id,
                title: format!("post {id} by user {user_id}"),
                body: format!(
                    "This is the body of post {id}. It was written by user \
                     {user_id} and exists to fill a list."
                ),
            })
            .collect();

        let albums = owned(ALBUMS_PER_USER)
            .map(|(user_id, id)| Album {
                user_id,
                id,
                title: format!("album {id}"),
            })
            .collect();

        let todos = owned(TODOS_PER_USER)
            .map(|(user_id, id)| Todo {
                user_id,
                id,
                title: format!("todo {id}"),
                completed: id % 3 == 0,
            })
            .collect();

        Self {
            users,
            posts,
            albums,
            todos,
        }
    }

    pub fn list(&self, resource: Resource) -> serde_json::Result<serde_json::Value> {
        match resource {
            Resource::Users => serde_json::to_value(&self.users),
            Resource::Posts => serde_json::to_value(&self.posts),
            Resource::Albums => serde_json::to_value(&self.albums),
            Resource::Todos => serde_json::to_value(&self.todos),
        }
    }

    pub fn item(
        &self,
        resource: Resource,
        id: u32,
    ) -> serde_json::Result<Option<serde_json::Value>> {
        match resource {
            Resource::Users => self
                .users
                .iter()
                .find(|user| user.id == id)
                .map(serde_json::to_value)
                .transpose(),
            Resource::Posts => self
                .posts
                .iter()
                .find(|post| post.id == id)
                .map(serde_json::to_value)
                .transpose(),
            Resource::Albums => self
                .albums
                .iter()
                .find(|album| album.id == id)
                .map(serde_json::to_value)
                .transpose(),
            Resource::Todos => self
                .todos
                .iter()
                .find(|todo| todo.id == id)
                .map(serde_json::to_value)
                .transpose(),
        }
    }
}
