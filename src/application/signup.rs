//! Registration against the backend, followed by storing the user locally.

use super::background::{BackgroundCall, CallLost};
use crate::domain::{BackendOutcome, BackendResult, User};
use crate::infrastructure::{Backend, UserStore};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, warn};

pub const ERROR_STORE_LOCALLY: &str = "Failed to store locally";
pub const ERROR_UPLOAD: &str = "Error uploading data";
pub const ERROR_INSTANCE_ID: &str = "Not updating instance id";

/// Receives the outcome of a sign-up.
pub trait SignUpView {
    fn on_sign_up_success(&mut self);
    fn on_sign_up_error(&mut self, message: &str);
    fn show_progress(&mut self, visible: bool);
}

struct PendingSignUp {
    user: User,
    call: BackgroundCall<BackendOutcome<BackendResult>>,
}

/// Drives one sign-up call at a time. Starting another replaces the first,
/// whose result is then dropped.
pub struct SignUpPresenter {
    backend: Arc<dyn Backend>,
    users: Rc<RefCell<UserStore>>,
    pending: Option<PendingSignUp>,
}

impl SignUpPresenter {
    pub fn new(backend: Arc<dyn Backend>, users: Rc<RefCell<UserStore>>) -> Self {
        Self {
            backend,
            users,
            pending: None,
        }
    }

    pub fn sign_up(&mut self, user: User, view: &mut dyn SignUpView) {
        view.show_progress(true);
        let backend = Arc::clone(&self.backend);
        let payload = user.clone();
        let call = BackgroundCall::spawn(move || backend.sign_up_user(&payload));
        self.pending = Some(PendingSignUp { user, call });
    }

    /// Re-registers the signed-in user when the device instance id changed.
    pub fn update_instance_id(&mut self, instance_id: &str, view: &mut dyn SignUpView) {
        let user = self.users.borrow().signed_user().cloned();
        match user {
            Some(mut user) if user.instance_id != instance_id => {
                info!(email = %user.email, "instance id changed, re-registering");
                user.instance_id = instance_id.to_string();
                self.sign_up(user, view);
            }
            _ => view.on_sign_up_error(ERROR_INSTANCE_ID),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Delivers the result to `view` if the call has finished.
    /// Returns whether anything was delivered.
    pub fn poll(&mut self, view: &mut dyn SignUpView) -> bool {
        let taken = match &self.pending {
            Some(pending) => pending.call.try_take(),
            None => return false,
        };
        match taken {
            Ok(None) => false,
            Ok(Some(outcome)) => {
                if let Some(pending) = self.pending.take() {
                    self.finish(pending.user, outcome, view);
                }
                true
            }
            Err(lost) => {
                self.pending = None;
                Self::abandon(lost, view);
                true
            }
        }
    }

    /// Blocks until the pending call finishes and delivers its result.
    pub fn wait(&mut self, view: &mut dyn SignUpView) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        match pending.call.wait() {
            Ok(outcome) => self.finish(pending.user, outcome, view),
            Err(lost) => Self::abandon(lost, view),
        }
        true
    }

    fn abandon(lost: CallLost, view: &mut dyn SignUpView) {
        warn!(error = %lost, "sign up call lost");
        view.on_sign_up_error(&format!("Connection error: {lost}"));
        view.show_progress(false);
    }

    fn finish(&mut self, user: User, outcome: BackendOutcome<BackendResult>, view: &mut dyn SignUpView) {
        match outcome {
            Ok(response) if response.result => {
                let stored = self.users.borrow_mut().store_user_info(&user);
                match stored {
                    Ok(rows) if rows > 0 => {
                        info!(email = %user.email, "signed up");
                        view.on_sign_up_success();
                    }
                    Ok(_) => {
                        warn!(email = %user.email, "registered remotely but nothing stored locally");
                        view.on_sign_up_error(ERROR_STORE_LOCALLY);
                    }
                    Err(e) => {
                        warn!(email = %user.email, error = %e, "registered remotely but local store failed");
                        view.on_sign_up_error(ERROR_STORE_LOCALLY);
                    }
                }
            }
            Ok(response) => {
                warn!(message = ?response.message, "backend rejected sign up");
                view.on_sign_up_error(ERROR_UPLOAD);
            }
            Err(e) if e.is_rejection() => {
                warn!(error = %e, "backend gave no usable sign up result");
                view.on_sign_up_error(ERROR_UPLOAD);
            }
            Err(e) => {
                warn!(error = %e, "sign up request failed");
                view.on_sign_up_error(&format!("Connection error: {e}"));
            }
        }
        view.show_progress(false);
    }
}
