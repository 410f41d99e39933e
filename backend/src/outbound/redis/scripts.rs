//! Server-side Lua used by the Redis item store.

/// Replace an item and keep its secondary index current in one step.
///
/// KEYS[1] item hash, KEYS[2] insertion counter.
/// ARGV[1] indexed attribute (empty when the table has no index),
/// ARGV[2] index key prefix, ARGV[3] primary key, ARGV[4..] field/value pairs.
/// Indexed values arrive tagged (`S:`), so the tag is stripped before use.
pub(crate) const PUT_ITEM: &str = r"
local indexed = ARGV[1]
local previous = false
if indexed ~= '' then
  previous = redis.call('HGET', KEYS[1], indexed)
end
redis.call('DEL', KEYS[1])
local current = false
for i = 4, #ARGV, 2 do
  redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
  if ARGV[i] == indexed then
    current = ARGV[i + 1]
  end
end
if indexed ~= '' and previous ~= current then
  if previous then
    redis.call('ZREM', ARGV[2] .. string.sub(previous, 3), ARGV[3])
  end
  if current then
    local position = redis.call('INCR', KEYS[2])
    redis.call('ZADD', ARGV[2] .. string.sub(current, 3), position, ARGV[3])
  end
end
return 1
";
