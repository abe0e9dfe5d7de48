//! Catalog of list endpoints.

use super::listing::{Filter, FilterKind, ListResource, Scope};
use crate::pagination::{PageLimits, SortSpec, SortTable};

const LIMITS: PageLimits = PageLimits {
    default_limit: 20,
    max_limit: 100,
};

// Reviews

const REVIEW_SORTS: &[SortSpec] = &[
    SortSpec::new("reviewed_at", "r.reviewed_at", "timestamptz"),
    SortSpec::new("rating", "r.rating", "integer"),
    SortSpec::new("status", "r.status::text", "text"),
];

const REVIEW_FILTERS: &[Filter] = &[
    Filter::new("status", FilterKind::Text, "r.status::text = {}"),
    Filter::new("platform", FilterKind::TextList, "r.platform::text = ANY({}::text[])"),
    Filter::new("sentiment", FilterKind::Text, "r.sentiment::text = {}"),
    Filter::new("rating_min", FilterKind::Integer, "r.rating >= {}"),
    Filter::new("rating_max", FilterKind::Integer, "r.rating <= {}"),
    Filter::new("date_from", FilterKind::Date, "r.reviewed_at::date >= {}::date"),
    Filter::new("date_to", FilterKind::Date, "r.reviewed_at::date <= {}::date"),
    Filter::new(
        "q",
        FilterKind::Search,
        "(r.author_name ILIKE {} OR COALESCE(r.title, '') ILIKE {} OR r.body ILIKE {})",
    ),
];

pub const REVIEWS: ListResource = ListResource {
    path: "/v1.0/reviews",
    columns: "r.id, r.platform::text AS platform, r.author_name, r.rating, r.title, r.body, \
              r.reviewed_at, r.status::text AS status, r.sentiment::text AS sentiment, \
              d.content AS draft_content",
    from: "reviews r \
           LEFT JOIN LATERAL (\
             SELECT rd.content FROM review_reply_drafts rd \
             WHERE rd.review_id = r.id ORDER BY rd.created_at DESC LIMIT 1\
           ) d ON TRUE",
    scope: Scope::Property,
    path_params: &[],
    scope_condition: "r.property_id = $1",
    sort: SortTable {
        columns: REVIEW_SORTS,
        default_key: "reviewed_at",
        id_column: "r.id",
    },
    filters: REVIEW_FILTERS,
    limits: LIMITS,
};

// Guest conversations

const CONVERSATION_SORTS: &[SortSpec] = &[
    SortSpec::new("last_message_at", "COALESCE(c.last_message_at, c.created_at)", "timestamptz"),
    SortSpec::new("unread_count", "c.unread_count", "integer"),
];

const CONVERSATION_FILTERS: &[Filter] = &[
    Filter::new("channel", FilterKind::TextList, "c.channel::text = ANY({}::text[])"),
    Filter::new("status", FilterKind::Text, "c.status::text = {}"),
    Filter::new("unread_only", FilterKind::Flag, "c.unread_count > 0"),
    Filter::new(
        "q",
        FilterKind::Search,
        "(COALESCE(g.full_name, '') ILIKE {} OR COALESCE(c.last_message_preview, '') ILIKE {})",
    ),
];

pub const CONVERSATIONS: ListResource = ListResource {
    path: "/v1.0/messages/conversations",
    columns: "c.id, c.channel::text AS channel, c.status::text AS status, c.unread_count, \
              c.last_message_at, c.last_message_preview, g.full_name AS guest_name, \
              b.check_in::text AS booking_check_in, b.check_out::text AS booking_check_out",
    from: "conversations c \
           LEFT JOIN guests g ON g.id = c.guest_id \
           LEFT JOIN bookings b ON b.id = c.booking_id",
    scope: Scope::Property,
    path_params: &[],
    scope_condition: "c.property_id = $1",
    sort: SortTable {
        columns: CONVERSATION_SORTS,
        default_key: "last_message_at",
        id_column: "c.id",
    },
    filters: CONVERSATION_FILTERS,
    limits: LIMITS,
};

// Social posts

const SOCIAL_POST_SORTS: &[SortSpec] = &[
    SortSpec::new("scheduled_at", "COALESCE(sp.scheduled_at, sp.created_at)", "timestamptz"),
    SortSpec::new("estimated_reach", "COALESCE(sp.estimated_reach, 0)", "integer"),
    SortSpec::new("created_at", "sp.created_at", "timestamptz"),
];

const SOCIAL_POST_FILTERS: &[Filter] = &[
    Filter::new("date", FilterKind::Date, "sp.scheduled_at::date = {}::date"),
    Filter::new("date_from", FilterKind::Date, "sp.scheduled_at::date >= {}::date"),
    Filter::new("date_to", FilterKind::Date, "sp.scheduled_at::date <= {}::date"),
    Filter::new(
        "platform",
        FilterKind::TextList,
        "EXISTS (SELECT 1 FROM social_post_platforms spp \
         WHERE spp.post_id = sp.id AND spp.platform::text = ANY({}::text[]))",
    ),
    Filter::new("status", FilterKind::TextList, "sp.status::text = ANY({}::text[])"),
    Filter::new(
        "q",
        FilterKind::Search,
        "(COALESCE(sp.title, '') ILIKE {} OR sp.content ILIKE {})",
    ),
];

pub const SOCIAL_POSTS: ListResource = ListResource {
    path: "/v1.0/social/posts",
    columns: "sp.id, sp.title, sp.content, sp.status::text AS status, sp.scheduled_at, \
              sp.published_at, sp.estimated_reach, sp.created_at, \
              COALESCE(pl.platforms, ARRAY[]::text[]) AS platforms, a.url AS asset_url",
    from: "social_posts sp \
           LEFT JOIN LATERAL (\
             SELECT array_agg(spp.platform::text ORDER BY spp.platform::text) AS platforms \
             FROM social_post_platforms spp WHERE spp.post_id = sp.id\
           ) pl ON TRUE \
           LEFT JOIN LATERAL (\
             SELECT spa.url FROM social_post_assets spa \
             WHERE spa.post_id = sp.id ORDER BY spa.position ASC LIMIT 1\
           ) a ON TRUE",
    scope: Scope::Property,
    path_params: &[],
    scope_condition: "sp.property_id = $1",
    sort: SortTable {
        columns: SOCIAL_POST_SORTS,
        default_key: "scheduled_at",
        id_column: "sp.id",
    },
    filters: SOCIAL_POST_FILTERS,
    limits: LIMITS,
};

// Campaigns

const CAMPAIGN_SORTS: &[SortSpec] = &[
    SortSpec::new("start_date", "c.start_date", "date"),
    SortSpec::new("revenue_total", "COALESCE(c.revenue_total, 0)", "numeric"),
    SortSpec::new("conversions_total", "COALESCE(c.conversions_total, 0)", "integer"),
    SortSpec::new("progress_percent", "COALESCE(c.progress_percent, 0)", "numeric"),
];

const CAMPAIGN_FILTERS: &[Filter] = &[
    Filter::new("status", FilterKind::TextList, "c.status::text = ANY({}::text[])"),
    Filter::new(
        "channel",
        FilterKind::TextList,
        "EXISTS (SELECT 1 FROM campaign_channels cc \
         WHERE cc.campaign_id = c.id AND cc.channel::text = ANY({}::text[]))",
    ),
    Filter::new(
        "q",
        FilterKind::Search,
        "(c.name ILIKE {} OR COALESCE(c.description, '') ILIKE {})",
    ),
    Filter::new("start_date_from", FilterKind::Date, "c.start_date >= {}::date"),
    Filter::new("start_date_to", FilterKind::Date, "c.start_date <= {}::date"),
];

pub const CAMPAIGNS: ListResource = ListResource {
    path: "/v1.0/campaigns",
    columns: "c.id, c.name, c.description, c.status::text AS status, \
              c.start_date::text AS start_date, c.end_date::text AS end_date, \
              c.revenue_total, c.conversions_total, c.progress_percent, \
              COALESCE(ch.channels, ARRAY[]::text[]) AS channels",
    from: "campaigns c \
           LEFT JOIN LATERAL (\
             SELECT array_agg(cc.channel::text ORDER BY cc.channel::text) AS channels \
             FROM campaign_channels cc WHERE cc.campaign_id = c.id\
           ) ch ON TRUE",
    scope: Scope::Property,
    path_params: &[],
    scope_condition: "c.property_id = $1",
    sort: SortTable {
        columns: CAMPAIGN_SORTS,
        default_key: "start_date",
        id_column: "c.id",
    },
    filters: CAMPAIGN_FILTERS,
    limits: LIMITS,
};

// Campaign templates, shared plus account-owned

const TEMPLATE_SORTS: &[SortSpec] = &[
    SortSpec::new("updated_at", "ct.updated_at", "timestamptz"),
    SortSpec::new("name", "ct.name", "text"),
    SortSpec::new("category", "ct.category", "text"),
];

const TEMPLATE_FILTERS: &[Filter] = &[
    Filter::new("category", FilterKind::Text, "ct.category ILIKE {}"),
    Filter::new("q", FilterKind::Search, "ct.name ILIKE {}"),
];

pub const CAMPAIGN_TEMPLATES: ListResource = ListResource {
    path: "/v1.0/campaign-templates",
    columns: "ct.id, ct.name, ct.category, ct.description, ct.content, \
              (ct.account_id IS NULL) AS is_global, ct.updated_at",
    from: "campaign_templates ct",
    scope: Scope::Account,
    path_params: &[],
    scope_condition: "ct.is_active = TRUE AND (ct.account_id IS NULL OR ct.account_id = $1)",
    sort: SortTable {
        columns: TEMPLATE_SORTS,
        default_key: "updated_at",
        id_column: "ct.id",
    },
    filters: TEMPLATE_FILTERS,
    limits: LIMITS,
};

// Property integrations

const INTEGRATION_SORTS: &[SortSpec] = &[
    SortSpec::new("updated_at", "pi.updated_at", "timestamptz"),
    SortSpec::new("provider", "pi.provider::text", "text"),
    SortSpec::new("status", "pi.status::text", "text"),
];

const INTEGRATION_FILTERS: &[Filter] = &[
    Filter::new("status", FilterKind::Text, "pi.status::text = {}"),
    Filter::new("provider", FilterKind::Text, "pi.provider::text = {}"),
    Filter::new("q", FilterKind::Search, "pi.provider::text ILIKE {}"),
];

pub const INTEGRATIONS: ListResource = ListResource {
    path: "/v1.0/settings/integrations",
    columns: "pi.id, pi.provider::text AS provider, pi.status::text AS status, \
              pi.external_account_id, pi.connected_at, pi.last_synced_at, pi.metadata, pi.updated_at",
    from: "property_integrations pi",
    scope: Scope::Property,
    path_params: &[],
    scope_condition: "pi.property_id = $1",
    sort: SortTable {
        columns: INTEGRATION_SORTS,
        default_key: "updated_at",
        id_column: "pi.id",
    },
    filters: INTEGRATION_FILTERS,
    limits: LIMITS,
};

// AI agent activity

const AGENT_ACTIVITY_SORTS: &[SortSpec] = &[
    SortSpec::new("started_at", "atr.started_at", "timestamptz"),
    SortSpec::new("status", "atr.status::text", "text"),
    SortSpec::new("response_time_ms", "COALESCE(atr.response_time_ms, 0)", "integer"),
];

const AGENT_ACTIVITY_FILTERS: &[Filter] = &[
    Filter::new("status", FilterKind::TextList, "atr.status::text = ANY({}::text[])"),
    Filter::new("agent_key", FilterKind::TextList, "aa.key::text = ANY({}::text[])"),
    Filter::new("date_from", FilterKind::Timestamp, "atr.started_at >= {}::timestamptz"),
    Filter::new("date_to", FilterKind::Timestamp, "atr.started_at <= {}::timestamptz"),
    Filter::new(
        "q",
        FilterKind::Search,
        "(atr.action ILIKE {} OR COALESCE(atr.details, '') ILIKE {})",
    ),
];

pub const AGENT_ACTIVITY: ListResource = ListResource {
    path: "/v1.0/agents/activity",
    columns: "atr.id, aa.key::text AS agent_key, aa.name AS agent_name, atr.task_type, atr.action, \
              atr.details, atr.status::text AS status, atr.started_at, atr.finished_at, \
              atr.response_time_ms, atr.time_saved_seconds",
    from: "ai_agent_task_runs atr LEFT JOIN ai_agents aa ON aa.id = atr.agent_id",
    scope: Scope::Property,
    path_params: &[],
    scope_condition: "atr.property_id = $1",
    sort: SortTable {
        columns: AGENT_ACTIVITY_SORTS,
        default_key: "started_at",
        id_column: "atr.id",
    },
    filters: AGENT_ACTIVITY_FILTERS,
    limits: LIMITS,
};

// Conversation thread

const THREAD_SORTS: &[SortSpec] = &[SortSpec::new("created_at", "cm.created_at", "timestamptz")];

pub const CONVERSATION_THREAD: ListResource = ListResource {
    path: "/v1.0/messages/conversations/{id}/thread",
    columns: "cm.id, cm.sender::text AS sender, cm.content, cm.is_ai_generated, \
              cm.delivery_status::text AS delivery_status, cm.created_at",
    from: "conversation_messages cm",
    scope: Scope::Property,
    path_params: &["id"],
    scope_condition: "cm.conversation_id = $2 AND EXISTS (\
                      SELECT 1 FROM conversations c WHERE c.id = $2 AND c.property_id = $1)",
    sort: SortTable {
        columns: THREAD_SORTS,
        default_key: "created_at",
        id_column: "cm.id",
    },
    filters: &[],
    limits: PageLimits {
        default_limit: 30,
        max_limit: 100,
    },
};

// Run history of a single agent

const AGENT_HISTORY_SORTS: &[SortSpec] = &[SortSpec::new("started_at", "atr.started_at", "timestamptz")];

const AGENT_HISTORY_FILTERS: &[Filter] = &[
    Filter::new("status", FilterKind::Text, "atr.status::text = {}"),
    Filter::new(
        "q",
        FilterKind::Search,
        "(atr.action ILIKE {} OR COALESCE(atr.details, '') ILIKE {})",
    ),
];

pub const AGENT_HISTORY: ListResource = ListResource {
    path: "/v1.0/agents/{key}/history",
    columns: "atr.id, atr.action, atr.details, atr.status::text AS status, atr.started_at, \
              atr.finished_at, atr.response_time_ms",
    from: "ai_agent_task_runs atr JOIN ai_agents aa ON aa.id = atr.agent_id",
    scope: Scope::Property,
    path_params: &["key"],
    // Compared as text so an unknown key is an empty page, not an enum cast error.
    scope_condition: "atr.property_id = $1 AND aa.key::text = $2",
    sort: SortTable {
        columns: AGENT_HISTORY_SORTS,
        default_key: "started_at",
        id_column: "atr.id",
    },
    filters: AGENT_HISTORY_FILTERS,
    limits: LIMITS,
};

/// Every list endpoint served by the API.
pub const ALL: &[ListResource] = &[
    REVIEWS,
    CONVERSATIONS,
    SOCIAL_POSTS,
    CAMPAIGNS,
    CAMPAIGN_TEMPLATES,
    INTEGRATIONS,
    AGENT_ACTIVITY,
    CONVERSATION_THREAD,
    AGENT_HISTORY,
];
