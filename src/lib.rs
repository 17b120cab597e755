pub mod social;

// Re-export the commonly used entry points
pub use social::{
    client::{ClientConfig, SocialClient},
    error::SocialError,
    event::{EventService, RegistrationStatus, RegistrationView, VisibleEvents},
    friend::{FriendService, FriendshipStatus},
    recipe::{match_recipes, RecipeMatch},
    types::ActionResult,
};
