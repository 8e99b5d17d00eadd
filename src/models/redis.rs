pub struct RedisKey;

impl RedisKey {
    pub fn rating(namespace: &str, creator_id: &str, submitted_at: &str) -> String {
        format!("{namespace}:rating:{creator_id}:{submitted_at}")
    }

    pub fn creator_ratings(namespace: &str, creator_id: &str) -> String {
        format!("{namespace}:creator:{creator_id}:ratings")
    }

    pub fn ratings_index(namespace: &str) -> String {
        format!("{namespace}:ratings:index")
    }

    // Tab sorts below every printable character, so index order matches
    // (creator_id, submitted_at) tuple order.
    pub fn index_member(creator_id: &str, submitted_at: &str) -> String {
        format!("{creator_id}\t{submitted_at}")
    }

    pub fn split_index_member(member: &str) -> Option<(&str, &str)> {
        member.split_once('\t')
    }
}
