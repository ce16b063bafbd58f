//! The helpdesk services as shared with the event handlers.

use std::sync::Arc;

use helpdesk_core::{Helpdesk, TokioClock};
use serenity::prelude::TypeMapKey;

use crate::gateway::SerenityGateway;

pub type BotHelpdesk = Helpdesk<SerenityGateway, TokioClock>;

pub struct Services {
    pub helpdesk: BotHelpdesk,
    pub gateway: SerenityGateway,
    pub command_prefix: String,
    pub activity: String,
}

impl TypeMapKey for Services {
    type Value = Arc<Services>;
}
