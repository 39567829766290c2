mod health;
mod links;
mod public;
mod uploads;

use crate::api::response::ApiError;
use crate::share::ShareError;
use crate::ui::ProgressTarget;

pub use health::health;
pub use links::{follow_link, get_link};
pub use public::serve_public;
pub use uploads::{create_file, create_text, ShareResponse};

/// Map a ShareError from the given form to an ApiError
fn share_error(target: ProgressTarget, e: ShareError) -> ApiError {
    let message = target.error_message(&e);
    if e.is_validation() {
        ApiError::bad_request(message)
    } else {
        ApiError::bad_gateway(message)
    }
}
