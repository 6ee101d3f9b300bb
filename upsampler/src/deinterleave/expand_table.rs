// Generated by table_generators/src/bin/generate_expand_table.rs

/// `EXPAND[x]` places bit `k` of `x` at bit `2 * k`, leaving every odd bit clear.
pub const EXPAND: [u32; 256] = [
    0x00000000, 0x00000001, 0x00000004, 0x00000005, 0x00000010, 0x00000011, 0x00000014, 0x00000015,
    0x00000040, 0x00000041, 0x00000044, 0x00000045, 0x00000050, 0x00000051, 0x00000054, 0x00000055,
    0x00000100, 0x00000101, 0x00000104, 0x00000105, 0x00000110, 0x00000111, 0x00000114, 0x00000115,
    0x00000140, 0x00000141, 0x00000144, 0x00000145, 0x00000150, 0x00000151, 0x00000154, 0x00000155,
    0x00000400, 0x00000401, 0x00000404, 0x00000405, 0x00000410, 0x00000411, 0x00000414, 0x00000415,
    0x00000440, 0x00000441, 0x00000444, 0x00000445, 0x00000450, 0x00000451, 0x00000454, 0x00000455,
    0x00000500, 0x00000501, 0x00000504, 0x00000505, 0x00000510, 0x00000511, 0x00000514, 0x00000515,
    0x00000540, 0x00000541, 0x00000544, 0x00000545, 0x00000550, 0x00000551, 0x00000554, 0x00000555,
    0x00001000, 0x00001001, 0x00001004, 0x00001005, 0x00001010, 0x00001011, 0x00001014, 0x00001015,
    0x00001040, 0x00001041, 0x00001044, 0x00001045, 0x00001050, 0x00001051, 0x00001054, 0x00001055,
    0x00001100, 0x00001101, 0x00001104, 0x00001105, 0x00001110, 0x00001111, 0x00001114, 0x00001115,
    0x00001140, 0x00001141, 0x00001144, 0x00001145, 0x00001150, 0x00001151, 0x00001154, 0x00001155,
    0x00001400, 0x00001401, 0x00001404, 0x00001405, 0x00001410, 0x00001411, 0x00001414, 0x00001415,
    0x00001440, 0x00001441, 0x00001444, 0x00001445, 0x00001450, 0x00001451, 0x00001454, 0x00001455,
    0x00001500, 0x00001501, 0x00001504, 0x00001505, 0x00001510, 0x00001511, 0x00001514, 0x00001515,
    0x00001540, 0x00001541, 0x00001544, 0x00001545, 0x00001550, 0x00001551, 0x00001554, 0x00001555,
    0x00004000, 0x00004001, 0x00004004, 0x00004005, 0x00004010, 0x00004011, 0x00004014, 0x00004015,
    0x00004040, 0x00004041, 0x00004044, 0x00004045, 0x00004050, 0x00004051, 0x00004054, 0x00004055,
    0x00004100, 0x00004101, 0x00004104, 0x00004105, 0x00004110, 0x00004111, 0x00004114, 0x00004115,
    0x00004140, 0x00004141, 0x00004144, 0x00004145, 0x00004150, 0x00004151, 0x00004154, 0x00004155,
    0x00004400, 0x00004401, 0x00004404, 0x00004405, 0x00004410, 0x00004411, 0x00004414, 0x00004415,
    0x00004440, 0x00004441, 0x00004444, 0x00004445, 0x00004450, 0x00004451, 0x00004454, 0x00004455,
    0x00004500, 0x00004501, 0x00004504, 0x00004505, 0x00004510, 0x00004511, 0x00004514, 0x00004515,
    0x00004540, 0x00004541, 0x00004544, 0x00004545, 0x00004550, 0x00004551, 0x00004554, 0x00004555,
    0x00005000, 0x00005001, 0x00005004, 0x00005005, 0x00005010, 0x00005011, 0x00005014, 0x00005015,
    0x00005040, 0x00005041, 0x00005044, 0x00005045, 0x00005050, 0x00005051, 0x00005054, 0x00005055,
    0x00005100, 0x00005101, 0x00005104, 0x00005105, 0x00005110, 0x00005111, 0x00005114, 0x00005115,
    0x00005140, 0x00005141, 0x00005144, 0x00005145, 0x00005150, 0x00005151, 0x00005154, 0x00005155,
    0x00005400, 0x00005401, 0x00005404, 0x00005405, 0x00005410, 0x00005411, 0x00005414, 0x00005415,
    0x00005440, 0x00005441, 0x00005444, 0x00005445, 0x00005450, 0x00005451, 0x00005454, 0x00005455,
    0x00005500, 0x00005501, 0x00005504, 0x00005505, 0x00005510, 0x00005511, 0x00005514, 0x00005515,
    0x00005540, 0x00005541, 0x00005544, 0x00005545, 0x00005550, 0x00005551, 0x00005554, 0x00005555,
];
